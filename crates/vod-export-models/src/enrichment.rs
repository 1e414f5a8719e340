use serde::{Deserialize, Serialize};

/// Third-party metadata for one catalog item or episode.
///
/// Image fields are provider-relative references (e.g. a TMDB path
/// fragment), resolved to bytes by the enrichment provider on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentRecord {
    pub tmdb_id: Option<u32>,
    pub title: Option<String>,
    pub year: Option<u16>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub votes: Option<u64>,
    pub poster: Option<String>,
    pub backdrop: Option<String>,
    /// Episode still image, only set on episode lookups.
    pub still: Option<String>,
}
