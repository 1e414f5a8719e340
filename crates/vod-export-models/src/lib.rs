pub mod account;
pub mod catalog;
pub mod enrichment;
pub mod listing;

pub use account::Account;
pub use catalog::{CatalogItem, Episode, MediaKind};
pub use enrichment::EnrichmentRecord;
pub use listing::Listing;
