use crate::cache::ListingCache;
use crate::layout::PathMapper;
use crate::nfo;
use crate::sanitize::{clean_title, safe_account_name};
use crate::writer::{self, MarkerOutcome};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vod_export_models::{Account, CatalogItem, Episode, MediaKind};
use vod_export_sources::{CatalogSource, EnrichmentProvider, ImageVariant};

const MARKER_EXT: &str = "strm";

/// How an item listing was obtained, and whether it can be trusted as
/// complete. Destructive cleanup is gated on `is_complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOutcome {
    /// Fetched from the source in full this run.
    Fresh,
    /// Served from the listing cache (only complete listings are cached).
    Cached,
    /// Fetched from the source but truncated by a mid-listing failure.
    Partial,
    /// Source failed and no cached listing exists.
    Unavailable,
}

impl ListingOutcome {
    pub fn is_complete(self) -> bool {
        matches!(self, ListingOutcome::Fresh | ListingOutcome::Cached)
    }
}

/// Per-root counters emitted when a pass finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub active: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountSummary {
    pub movies: PassSummary,
    pub series: PassSummary,
}

/// Immutable per-run options for the reconciler. `{XC_NAME}` in the root
/// templates expands to the account's directory-safe name.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub movies_dir: String,
    pub series_dir: String,
    pub export_movies: bool,
    pub export_series: bool,
    pub delete_old: bool,
    pub refresh: bool,
    pub component_limit: usize,
}

/// Drives one export pass per account: listing (cache or source), marker
/// and sidecar emission, then reconciliation of the on-disk tree against
/// the set of paths this pass produced.
pub struct Reconciler {
    source: Box<dyn CatalogSource>,
    cache: ListingCache,
    enrichment: Option<Arc<dyn EnrichmentProvider>>,
    mapper: PathMapper,
    options: ExportOptions,
}

impl Reconciler {
    pub fn new(
        source: Box<dyn CatalogSource>,
        cache: ListingCache,
        enrichment: Option<Arc<dyn EnrichmentProvider>>,
        options: ExportOptions,
    ) -> Self {
        let mapper = PathMapper::new(options.component_limit);
        Self {
            source,
            cache,
            enrichment,
            mapper,
            options,
        }
    }

    pub async fn export_account(&self, account: &Account) -> Result<AccountSummary> {
        info!(
            "Exporting account '{}' via {}",
            account.display_name(),
            self.source.source_name()
        );

        let mut summary = AccountSummary::default();
        if self.options.export_movies {
            summary.movies = self.export_movies(account).await?;
        }
        if self.options.export_series {
            summary.series = self.export_series(account).await?;
        }
        Ok(summary)
    }

    fn root_for(&self, template: &str, account: &Account) -> PathBuf {
        PathBuf::from(template.replace("{XC_NAME}", &safe_account_name(&account.display_name())))
    }

    /// Movie listing per cache policy: cache hit wins unless refreshing;
    /// source failure falls back to cache with a warning; a partial fetch
    /// is used but never cached.
    async fn movie_listing(&self, account: &Account) -> (ListingOutcome, Vec<CatalogItem>) {
        if !self.options.refresh {
            if let Some(rows) = self.cache.load_movies(account) {
                return (ListingOutcome::Cached, rows);
            }
        }

        match self.source.list_movies(account).await {
            Ok(listing) if listing.complete => {
                if let Err(e) = self.cache.save_movies(account, &listing.rows) {
                    warn!("Failed to cache movie listing: {e:#}");
                }
                (ListingOutcome::Fresh, listing.rows)
            }
            Ok(listing) => (ListingOutcome::Partial, listing.rows),
            Err(e) => {
                warn!(
                    "Movie listing failed for '{}': {e}. Trying cache.",
                    account.display_name()
                );
                match self.cache.load_movies(account) {
                    Some(rows) => (ListingOutcome::Cached, rows),
                    None => (ListingOutcome::Unavailable, Vec::new()),
                }
            }
        }
    }

    async fn series_listing(&self, account: &Account) -> (ListingOutcome, Vec<CatalogItem>) {
        if !self.options.refresh {
            if let Some(rows) = self.cache.load_series(account) {
                return (ListingOutcome::Cached, rows);
            }
        }

        match self.source.list_series(account).await {
            Ok(listing) if listing.complete => {
                if let Err(e) = self.cache.save_series(account, &listing.rows) {
                    warn!("Failed to cache series listing: {e:#}");
                }
                (ListingOutcome::Fresh, listing.rows)
            }
            Ok(listing) => (ListingOutcome::Partial, listing.rows),
            Err(e) => {
                warn!(
                    "Series listing failed for '{}': {e}. Trying cache.",
                    account.display_name()
                );
                match self.cache.load_series(account) {
                    Some(rows) => (ListingOutcome::Cached, rows),
                    None => (ListingOutcome::Unavailable, Vec::new()),
                }
            }
        }
    }

    async fn episode_listing(
        &self,
        account: &Account,
        series_id: u64,
    ) -> (ListingOutcome, Vec<Episode>) {
        if !self.options.refresh {
            if let Some(rows) = self.cache.load_episodes(account, series_id) {
                return (ListingOutcome::Cached, rows);
            }
        }

        match self.source.list_episodes(account, series_id).await {
            Ok(listing) if listing.complete => {
                if let Err(e) = self.cache.save_episodes(account, series_id, &listing.rows) {
                    warn!("Failed to cache episode listing: {e:#}");
                }
                (ListingOutcome::Fresh, listing.rows)
            }
            Ok(listing) => (ListingOutcome::Partial, listing.rows),
            Err(e) => {
                warn!("Episode listing failed for series {series_id}: {e}. Trying cache.");
                match self.cache.load_episodes(account, series_id) {
                    Some(rows) => (ListingOutcome::Cached, rows),
                    None => (ListingOutcome::Unavailable, Vec::new()),
                }
            }
        }
    }

    async fn export_movies(&self, account: &Account) -> Result<PassSummary> {
        let root = self.root_for(&self.options.movies_dir, account);
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating movies root {}", root.display()))?;

        let (outcome, items) = self.movie_listing(account).await;
        if outcome == ListingOutcome::Unavailable {
            warn!(
                "No movie listing available for '{}', skipping this root",
                account.display_name()
            );
            return Ok(PassSummary::default());
        }
        info!(
            "Processing {} movie(s) for '{}' (listing: {:?})",
            items.len(),
            account.display_name(),
            outcome
        );

        let mut summary = PassSummary::default();
        let mut expected: HashSet<PathBuf> = HashSet::new();
        let step = (items.len() / 10).max(1);

        for (idx, item) in items.iter().enumerate() {
            if idx > 0 && idx % step == 0 {
                info!("Movies: {}/{}", idx, items.len());
            }

            let Some(playback_id) = item.playback_id.as_deref() else {
                warn!("Movie '{}' (id {}) has no playback id, skipping", item.name, item.id);
                summary.skipped += 1;
                continue;
            };

            let mut title = clean_title(&item.name);
            if title.is_empty() {
                title = "Unknown Movie".to_string();
            }
            let category = item.category.as_deref().unwrap_or("Uncategorized");

            let folder = self
                .mapper
                .movie_folder(category, &title, item.year)
                .iter()
                .fold(root.clone(), |p, seg| p.join(seg));
            let base = self.mapper.title_with_year(&title, item.year);
            let marker = folder.join(format!("{base}.{MARKER_EXT}"));

            let url = self.source.movie_url(playback_id);
            match writer::write_marker(&marker, &url) {
                Ok(MarkerOutcome::Created) => summary.added += 1,
                Ok(MarkerOutcome::Overwritten) => summary.updated += 1,
                Err(e) => {
                    warn!("Failed to write marker {}: {e:#}", marker.display());
                    summary.skipped += 1;
                    continue;
                }
            }
            expected.insert(marker);

            if let Some(provider) = &self.enrichment {
                if let Err(e) = self
                    .enrich_movie(provider.as_ref(), &folder, &base, &title, item)
                    .await
                {
                    debug!("Enrichment failed for '{title}': {e}");
                }
            }
        }

        summary.active = expected.len();

        if self.options.delete_old && outcome.is_complete() {
            summary.removed = cleanup_root(&root, &expected)?;
        } else if self.options.delete_old {
            warn!("Movie listing not complete, skipping cleanup under {}", root.display());
        }

        info!(
            "Movies done for '{}': {} added, {} updated, {} removed, {} active, {} skipped",
            account.display_name(),
            summary.added,
            summary.updated,
            summary.removed,
            summary.active,
            summary.skipped
        );
        Ok(summary)
    }

    async fn export_series(&self, account: &Account) -> Result<PassSummary> {
        let root = self.root_for(&self.options.series_dir, account);
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating series root {}", root.display()))?;

        let (outcome, items) = self.series_listing(account).await;
        if outcome == ListingOutcome::Unavailable {
            warn!(
                "No series listing available for '{}', skipping this root",
                account.display_name()
            );
            return Ok(PassSummary::default());
        }
        info!(
            "Processing {} series for '{}' (listing: {:?})",
            items.len(),
            account.display_name(),
            outcome
        );

        let mut summary = PassSummary::default();
        let mut expected: HashSet<PathBuf> = HashSet::new();
        let mut episodes_complete = true;
        let step = (items.len() / 10).max(1);

        for (idx, series) in items.iter().enumerate() {
            if idx > 0 && idx % step == 0 {
                info!("Series: {}/{}", idx, items.len());
            }

            let mut title = clean_title(&series.name);
            if title.is_empty() {
                title = "Unknown Series".to_string();
            }
            let category = series.category.as_deref().unwrap_or("Uncategorized");

            let folder = self
                .mapper
                .series_folder(category, &title, series.year)
                .iter()
                .fold(root.clone(), |p, seg| p.join(seg));

            if let Some(provider) = &self.enrichment {
                if let Err(e) = self
                    .enrich_series(provider.as_ref(), &folder, &title, series)
                    .await
                {
                    debug!("Enrichment failed for '{title}': {e}");
                }
            }

            let (ep_outcome, episodes) = self.episode_listing(account, series.id).await;
            if !ep_outcome.is_complete() {
                episodes_complete = false;
            }
            if ep_outcome == ListingOutcome::Unavailable {
                warn!("No episode listing for series '{title}', markers unchanged");
                summary.skipped += 1;
                continue;
            }

            for ep in &episodes {
                let Some(playback_id) = ep.playback_id.as_deref() else {
                    debug!("Episode S{:02}E{:02} of '{title}' has no playback id, skipping", ep.season, ep.episode);
                    summary.skipped += 1;
                    continue;
                };

                let mut ep_title = clean_title(&ep.title);
                if ep_title.is_empty() {
                    ep_title = format!("Episode {}", ep.episode);
                }
                let base = self.mapper.episode_file_base(ep.season, ep.episode, &ep_title);
                let season_dir = folder.join(self.mapper.season_dir(ep.season));
                let marker = season_dir.join(format!("{base}.{MARKER_EXT}"));

                let url = self.source.episode_url(playback_id);
                match writer::write_marker(&marker, &url) {
                    Ok(MarkerOutcome::Created) => summary.added += 1,
                    Ok(MarkerOutcome::Overwritten) => summary.updated += 1,
                    Err(e) => {
                        warn!("Failed to write marker {}: {e:#}", marker.display());
                        summary.skipped += 1;
                        continue;
                    }
                }
                expected.insert(marker);

                if let Some(provider) = &self.enrichment {
                    if let Err(e) = self
                        .enrich_episode(provider.as_ref(), &season_dir, &base, &ep_title, series, ep)
                        .await
                    {
                        debug!("Enrichment failed for episode '{ep_title}': {e}");
                    }
                }
            }
        }

        summary.active = expected.len();

        // Deleting an episode marker is only safe when both the series
        // listing and every episode listing were complete.
        if self.options.delete_old && outcome.is_complete() && episodes_complete {
            summary.removed = cleanup_root(&root, &expected)?;
        } else if self.options.delete_old {
            warn!("Series listings not complete, skipping cleanup under {}", root.display());
        }

        info!(
            "Series done for '{}': {} added, {} updated, {} removed, {} active, {} skipped",
            account.display_name(),
            summary.added,
            summary.updated,
            summary.removed,
            summary.active,
            summary.skipped
        );
        Ok(summary)
    }

    /// Resolve an enrichment record: exact external id first, title search
    /// as fallback. Absence is not an error.
    async fn resolve_record(
        &self,
        provider: &dyn EnrichmentProvider,
        kind: MediaKind,
        tmdb_id: Option<u32>,
        title: &str,
        year: Option<u16>,
    ) -> Result<Option<vod_export_models::EnrichmentRecord>, vod_export_sources::EnrichError> {
        if let Some(id) = tmdb_id {
            if let Some(rec) = provider.lookup(kind, id).await? {
                return Ok(Some(rec));
            }
        }
        provider.search(kind, title, year).await
    }

    async fn enrich_movie(
        &self,
        provider: &dyn EnrichmentProvider,
        folder: &Path,
        base: &str,
        title: &str,
        item: &CatalogItem,
    ) -> Result<(), vod_export_sources::EnrichError> {
        let nfo_path = folder.join(format!("{base}.nfo"));
        let poster_path = folder.join("poster.jpg");
        let fanart_path = folder.join("fanart.jpg");
        if nfo_path.exists() && poster_path.exists() && fanart_path.exists() {
            return Ok(());
        }

        let record = self
            .resolve_record(provider, MediaKind::Movie, item.tmdb_id, title, item.year)
            .await?;

        let nfo = nfo::movie_nfo(title, item.year, record.as_ref());
        if let Err(e) = writer::write_sidecar(&nfo_path, nfo.as_bytes(), false) {
            warn!("Failed to write {}: {e:#}", nfo_path.display());
        }

        if let Some(rec) = &record {
            self.fetch_image(provider, rec.poster.as_deref(), &poster_path, ImageVariant::Poster)
                .await;
            self.fetch_image(provider, rec.backdrop.as_deref(), &fanart_path, ImageVariant::Backdrop)
                .await;
        }
        Ok(())
    }

    async fn enrich_series(
        &self,
        provider: &dyn EnrichmentProvider,
        folder: &Path,
        title: &str,
        series: &CatalogItem,
    ) -> Result<(), vod_export_sources::EnrichError> {
        let nfo_path = folder.join("tvshow.nfo");
        let poster_path = folder.join("poster.jpg");
        let fanart_path = folder.join("fanart.jpg");
        if nfo_path.exists() && poster_path.exists() && fanart_path.exists() {
            return Ok(());
        }

        let record = self
            .resolve_record(provider, MediaKind::Series, series.tmdb_id, title, series.year)
            .await?;

        let nfo = nfo::tvshow_nfo(title, series.year, record.as_ref());
        if let Err(e) = writer::write_sidecar(&nfo_path, nfo.as_bytes(), false) {
            warn!("Failed to write {}: {e:#}", nfo_path.display());
        }

        if let Some(rec) = &record {
            self.fetch_image(provider, rec.poster.as_deref(), &poster_path, ImageVariant::Poster)
                .await;
            self.fetch_image(provider, rec.backdrop.as_deref(), &fanart_path, ImageVariant::Backdrop)
                .await;
        }
        Ok(())
    }

    async fn enrich_episode(
        &self,
        provider: &dyn EnrichmentProvider,
        season_dir: &Path,
        base: &str,
        title: &str,
        series: &CatalogItem,
        ep: &Episode,
    ) -> Result<(), vod_export_sources::EnrichError> {
        let nfo_path = season_dir.join(format!("{base}.nfo"));
        let thumb_path = season_dir.join(format!("{base}-thumb.jpg"));
        if nfo_path.exists() && thumb_path.exists() {
            return Ok(());
        }

        let record = match series.tmdb_id {
            Some(id) => provider.lookup_episode(id, ep.season, ep.episode).await?,
            None => None,
        };

        let nfo = nfo::episode_nfo(title, ep.season, ep.episode, record.as_ref());
        if let Err(e) = writer::write_sidecar(&nfo_path, nfo.as_bytes(), false) {
            warn!("Failed to write {}: {e:#}", nfo_path.display());
        }

        if let Some(rec) = &record {
            self.fetch_image(provider, rec.still.as_deref(), &thumb_path, ImageVariant::Still)
                .await;
        }
        Ok(())
    }

    /// Best-effort image sidecar. Existing files short-circuit before the
    /// remote fetch so images are downloaded at most once.
    async fn fetch_image(
        &self,
        provider: &dyn EnrichmentProvider,
        image_ref: Option<&str>,
        path: &Path,
        variant: ImageVariant,
    ) {
        let Some(image_ref) = image_ref else { return };
        if path.exists() {
            return;
        }
        match provider.image(image_ref, variant).await {
            Ok(Some(bytes)) => {
                if let Err(e) = writer::write_sidecar(path, &bytes, false) {
                    warn!("Failed to write {}: {e:#}", path.display());
                }
            }
            Ok(None) => debug!("No image at {image_ref}"),
            Err(e) => debug!("Image fetch failed for {image_ref}: {e}"),
        }
    }
}

/// Delete every marker under `root` not in `expected`, then prune empty
/// directories deepest-first. Returns the number of markers removed.
fn cleanup_root(root: &Path, expected: &HashSet<PathBuf>) -> Result<usize> {
    let mut markers = Vec::new();
    collect_markers(root, &mut markers)?;

    let mut removed = 0;
    for path in markers {
        if !expected.contains(&path) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!("Removed stale marker {}", path.display());
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove {}: {e}", path.display()),
            }
        }
    }

    let mut dirs = Vec::new();
    collect_dirs(root, &mut dirs)?;
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in dirs {
        // Fails on non-empty directories, which is the common case.
        let _ = std::fs::remove_dir(&dir);
    }

    Ok(removed)
}

fn collect_markers(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            collect_markers(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(MARKER_EXT) {
            out.push(path);
        }
    }
    Ok(())
}

fn collect_dirs(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            out.push(path.clone());
            collect_dirs(&path, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
