use crate::error::{EnrichError, SourceError};
use async_trait::async_trait;
use vod_export_models::{Account, CatalogItem, EnrichmentRecord, Episode, Listing, MediaKind};

/// A remote media catalog: lists accounts, movies, series, and episodes,
/// and knows how to build a playback URL for a stable item identifier.
///
/// Listing calls are total: an account with no content yields an empty
/// complete listing, and transport failures surface as `SourceError` so
/// callers can tell "nothing there" from "listing failed". A paginated
/// fetch that dies mid-run returns the rows collected so far as a partial
/// listing instead of discarding them.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn source_name(&self) -> &str;

    async fn authenticate(&mut self) -> Result<(), SourceError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, SourceError>;

    async fn list_movies(&self, account: &Account) -> Result<Listing<CatalogItem>, SourceError>;

    async fn list_series(&self, account: &Account) -> Result<Listing<CatalogItem>, SourceError>;

    async fn list_episodes(
        &self,
        account: &Account,
        series_id: u64,
    ) -> Result<Listing<Episode>, SourceError>;

    fn movie_url(&self, playback_id: &str) -> String;

    fn episode_url(&self, playback_id: &str) -> String;
}

/// Image flavor requested from an enrichment provider; decides the
/// rendition size fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVariant {
    Poster,
    Backdrop,
    Still,
}

/// Optional third-party metadata lookups. All operations return
/// `Ok(None)` when the provider simply has nothing for the item.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    /// Exact lookup by external metadata id.
    async fn lookup(
        &self,
        kind: MediaKind,
        id: u32,
    ) -> Result<Option<EnrichmentRecord>, EnrichError>;

    /// Title search fallback. Among results, one whose release year matches
    /// `year` exactly is preferred; otherwise the first result is taken.
    async fn search(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> Result<Option<EnrichmentRecord>, EnrichError>;

    async fn lookup_episode(
        &self,
        series_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<Option<EnrichmentRecord>, EnrichError>;

    async fn image(
        &self,
        image_ref: &str,
        variant: ImageVariant,
    ) -> Result<Option<Vec<u8>>, EnrichError>;
}
