use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

/// One movie or series row, normalized at the catalog-source boundary.
///
/// `playback_id` is the stable identifier used to build the streamable URL;
/// rows without one cannot produce a marker file and are skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: u64,
    pub playback_id: Option<String>,
    pub name: String,
    pub year: Option<u16>,
    pub category: Option<String>,
    /// External metadata id (TMDB), when the provider carries one.
    pub tmdb_id: Option<u32>,
}

/// One episode of a series. Season 0 is the "unspecified season" bucket,
/// not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub playback_id: Option<String>,
    pub season: u32,
    pub episode: u32,
    pub title: String,
}
