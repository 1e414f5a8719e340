pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{ApiConfig, Config, ExportConfig, SchedulerConfig, TmdbConfig};
pub use credentials::CredentialStore;
pub use paths::PathManager;
