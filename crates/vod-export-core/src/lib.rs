pub mod cache;
pub mod check;
pub mod layout;
pub mod nfo;
pub mod reconcile;
pub mod sanitize;
pub mod writer;

pub use cache::ListingCache;
pub use check::{check_root, CheckReport, Problem};
pub use layout::PathMapper;
pub use reconcile::{AccountSummary, ExportOptions, ListingOutcome, PassSummary, Reconciler};
pub use writer::{write_marker, write_sidecar, MarkerOutcome, SidecarOutcome};
