pub mod accounts;
pub mod dispatcharr;
pub mod error;
pub mod tmdb;
pub mod traits;

pub use accounts::{filter_accounts, matches_any, parse_patterns};
pub use dispatcharr::DispatcharrClient;
pub use error::{EnrichError, SourceError};
pub use tmdb::TmdbClient;
pub use traits::{CatalogSource, EnrichmentProvider, ImageVariant};
