use super::*;
use crate::cache::ListingCache;
use async_trait::async_trait;
use std::collections::HashMap;
use vod_export_models::{EnrichmentRecord, Listing};
use vod_export_sources::{EnrichError, SourceError};

#[derive(Clone, Default)]
struct StubSource {
    movies: Vec<CatalogItem>,
    series: Vec<CatalogItem>,
    episodes: HashMap<u64, Vec<Episode>>,
    fail_movies: bool,
    partial_movies: bool,
}

#[async_trait]
impl CatalogSource for StubSource {
    fn source_name(&self) -> &str {
        "stub"
    }

    async fn authenticate(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, SourceError> {
        Ok(Vec::new())
    }

    async fn list_movies(&self, _account: &Account) -> Result<Listing<CatalogItem>, SourceError> {
        if self.fail_movies {
            return Err(SourceError::Auth("source down".to_string()));
        }
        if self.partial_movies {
            return Ok(Listing::partial(self.movies.clone()));
        }
        Ok(Listing::complete(self.movies.clone()))
    }

    async fn list_series(&self, _account: &Account) -> Result<Listing<CatalogItem>, SourceError> {
        Ok(Listing::complete(self.series.clone()))
    }

    async fn list_episodes(
        &self,
        _account: &Account,
        series_id: u64,
    ) -> Result<Listing<Episode>, SourceError> {
        Ok(Listing::complete(
            self.episodes.get(&series_id).cloned().unwrap_or_default(),
        ))
    }

    fn movie_url(&self, playback_id: &str) -> String {
        format!("http://stub/movie/{playback_id}")
    }

    fn episode_url(&self, playback_id: &str) -> String {
        format!("http://stub/episode/{playback_id}")
    }
}

struct StubProvider;

#[async_trait]
impl EnrichmentProvider for StubProvider {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn lookup(
        &self,
        _kind: MediaKind,
        id: u32,
    ) -> Result<Option<EnrichmentRecord>, EnrichError> {
        Ok(Some(EnrichmentRecord {
            tmdb_id: Some(id),
            overview: Some("A stub plot.".to_string()),
            poster: Some("/p.jpg".to_string()),
            backdrop: Some("/b.jpg".to_string()),
            ..Default::default()
        }))
    }

    async fn search(
        &self,
        _kind: MediaKind,
        _title: &str,
        _year: Option<u16>,
    ) -> Result<Option<EnrichmentRecord>, EnrichError> {
        Ok(None)
    }

    async fn lookup_episode(
        &self,
        _series_id: u32,
        _season: u32,
        _episode: u32,
    ) -> Result<Option<EnrichmentRecord>, EnrichError> {
        Ok(Some(EnrichmentRecord {
            overview: Some("A stub episode plot.".to_string()),
            still: Some("/s.jpg".to_string()),
            ..Default::default()
        }))
    }

    async fn image(
        &self,
        _image_ref: &str,
        _variant: ImageVariant,
    ) -> Result<Option<Vec<u8>>, EnrichError> {
        Ok(Some(vec![0xFF, 0xD8]))
    }
}

fn account() -> Account {
    Account {
        id: 1,
        name: "Acme".to_string(),
        server_url: None,
    }
}

fn movie(id: u64, uuid: &str, name: &str, year: Option<u16>, category: &str) -> CatalogItem {
    CatalogItem {
        id,
        playback_id: Some(uuid.to_string()),
        name: name.to_string(),
        year,
        category: Some(category.to_string()),
        tmdb_id: None,
    }
}

fn options(base: &Path, delete_old: bool, refresh: bool) -> ExportOptions {
    ExportOptions {
        movies_dir: base.join("Movies").to_string_lossy().into_owned(),
        series_dir: base.join("Series").to_string_lossy().into_owned(),
        export_movies: true,
        export_series: false,
        delete_old,
        refresh,
        component_limit: 80,
    }
}

fn reconciler(source: StubSource, cache_dir: &Path, opts: ExportOptions) -> Reconciler {
    let cache = ListingCache::new(cache_dir.to_path_buf()).unwrap();
    Reconciler::new(Box::new(source), cache, None, opts)
}

fn tree_markers(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if root.exists() {
        collect_markers(root, &mut out).unwrap();
    }
    out.sort();
    out
}

#[tokio::test]
async fn test_movie_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let src = StubSource {
        movies: vec![movie(1, "u1", "Movie.Name.[1080p].(2023)", Some(2023), "Action")],
        ..Default::default()
    };
    let r = reconciler(src, &tmp.path().join("cache"), options(tmp.path(), true, true));

    let summary = r.export_account(&account()).await.unwrap();
    assert_eq!(summary.movies.added, 1);
    assert_eq!(summary.movies.active, 1);
    assert_eq!(summary.movies.skipped, 0);

    let marker = tmp
        .path()
        .join("Movies/Action/Movie Name (2023)/Movie Name (2023).strm");
    assert_eq!(
        std::fs::read_to_string(&marker).unwrap(),
        "http://stub/movie/u1\n"
    );
}

#[tokio::test]
async fn test_idempotence() {
    let tmp = tempfile::tempdir().unwrap();
    let src = StubSource {
        movies: vec![
            movie(1, "u1", "Alpha", Some(2020), "Action"),
            movie(2, "u2", "Beta", None, "Drama"),
        ],
        ..Default::default()
    };
    let cache_dir = tmp.path().join("cache");

    let r1 = reconciler(src.clone(), &cache_dir, options(tmp.path(), true, true));
    let first = r1.export_account(&account()).await.unwrap();
    assert_eq!(first.movies.added, 2);
    let markers_after_first = tree_markers(&tmp.path().join("Movies"));

    let r2 = reconciler(src, &cache_dir, options(tmp.path(), true, true));
    let second = r2.export_account(&account()).await.unwrap();
    assert_eq!(second.movies.added, 0);
    assert_eq!(second.movies.removed, 0);
    assert_eq!(second.movies.active, first.movies.active);
    assert_eq!(tree_markers(&tmp.path().join("Movies")), markers_after_first);
}

#[tokio::test]
async fn test_removed_movie_is_cleaned_up() {
    let tmp = tempfile::tempdir().unwrap();
    let cache_dir = tmp.path().join("cache");
    let src = StubSource {
        movies: vec![movie(1, "u1", "Gone Soon", Some(2020), "Action")],
        ..Default::default()
    };

    let r1 = reconciler(src, &cache_dir, options(tmp.path(), true, true));
    r1.export_account(&account()).await.unwrap();
    assert_eq!(tree_markers(&tmp.path().join("Movies")).len(), 1);

    let r2 = reconciler(
        StubSource::default(),
        &cache_dir,
        options(tmp.path(), true, true),
    );
    let second = r2.export_account(&account()).await.unwrap();
    assert_eq!(second.movies.removed, 1);
    assert_eq!(second.movies.active, 0);

    assert!(tree_markers(&tmp.path().join("Movies")).is_empty());
    // Empty title and category directories are pruned; the root stays.
    assert!(!tmp.path().join("Movies/Action").exists());
    assert!(tmp.path().join("Movies").exists());
}

#[tokio::test]
async fn test_partial_listing_suppresses_cleanup() {
    let tmp = tempfile::tempdir().unwrap();
    let cache_dir = tmp.path().join("cache");
    let both = vec![
        movie(1, "u1", "Keep Me", Some(2020), "Action"),
        movie(2, "u2", "Also Keep", Some(2021), "Action"),
    ];

    let r1 = reconciler(
        StubSource { movies: both.clone(), ..Default::default() },
        &cache_dir,
        options(tmp.path(), true, true),
    );
    r1.export_account(&account()).await.unwrap();

    // Second run only sees one movie and the listing is marked partial.
    let r2 = reconciler(
        StubSource {
            movies: vec![both[0].clone()],
            partial_movies: true,
            ..Default::default()
        },
        &cache_dir,
        options(tmp.path(), true, true),
    );
    let second = r2.export_account(&account()).await.unwrap();
    assert_eq!(second.movies.removed, 0);
    assert_eq!(tree_markers(&tmp.path().join("Movies")).len(), 2);
}

#[tokio::test]
async fn test_unavailable_listing_leaves_tree_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let src = StubSource {
        movies: vec![movie(1, "u1", "Survivor", Some(2020), "Action")],
        ..Default::default()
    };

    let r1 = reconciler(src, &tmp.path().join("cache1"), options(tmp.path(), true, true));
    r1.export_account(&account()).await.unwrap();
    let before = tree_markers(&tmp.path().join("Movies"));

    // Source down, fresh cache directory: nothing to fall back on.
    let r2 = reconciler(
        StubSource { fail_movies: true, ..Default::default() },
        &tmp.path().join("cache2"),
        options(tmp.path(), true, true),
    );
    let second = r2.export_account(&account()).await.unwrap();
    assert_eq!(second.movies, PassSummary::default());
    assert_eq!(tree_markers(&tmp.path().join("Movies")), before);
}

#[tokio::test]
async fn test_source_failure_falls_back_to_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let cache_dir = tmp.path().join("cache");
    let src = StubSource {
        movies: vec![movie(1, "u1", "Cached Movie", Some(2020), "Action")],
        ..Default::default()
    };

    let r1 = reconciler(src, &cache_dir, options(tmp.path(), true, true));
    r1.export_account(&account()).await.unwrap();

    let r2 = reconciler(
        StubSource { fail_movies: true, ..Default::default() },
        &cache_dir,
        options(tmp.path(), true, true),
    );
    let second = r2.export_account(&account()).await.unwrap();
    // Cached listing keeps the marker alive and cleanup still runs.
    assert_eq!(second.movies.active, 1);
    assert_eq!(second.movies.removed, 0);
    assert_eq!(tree_markers(&tmp.path().join("Movies")).len(), 1);
}

#[tokio::test]
async fn test_missing_playback_id_skips_item() {
    let tmp = tempfile::tempdir().unwrap();
    let mut bad = movie(1, "unused", "No Stream", Some(2020), "Action");
    bad.playback_id = None;
    let src = StubSource {
        movies: vec![bad, movie(2, "u2", "Fine", Some(2020), "Action")],
        ..Default::default()
    };

    let r = reconciler(src, &tmp.path().join("cache"), options(tmp.path(), true, true));
    let summary = r.export_account(&account()).await.unwrap();
    assert_eq!(summary.movies.skipped, 1);
    assert_eq!(summary.movies.added, 1);
    assert_eq!(summary.movies.active, 1);
}

#[tokio::test]
async fn test_series_episode_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let series = CatalogItem {
        id: 7,
        playback_id: None,
        name: "Show".to_string(),
        year: None,
        category: Some("Drama".to_string()),
        tmdb_id: None,
    };
    let mut episodes = HashMap::new();
    episodes.insert(
        7,
        vec![Episode {
            playback_id: Some("e1".to_string()),
            season: 1,
            episode: 1,
            title: "Pilot".to_string(),
        }],
    );
    let src = StubSource { series: vec![series], episodes, ..Default::default() };

    let mut opts = options(tmp.path(), true, true);
    opts.export_movies = false;
    opts.export_series = true;
    let r = reconciler(src, &tmp.path().join("cache"), opts);

    let summary = r.export_account(&account()).await.unwrap();
    assert_eq!(summary.series.added, 1);

    let marker = tmp
        .path()
        .join("Series/Drama/Show/Season 01/S01E01 - Pilot.strm");
    assert_eq!(
        std::fs::read_to_string(&marker).unwrap(),
        "http://stub/episode/e1\n"
    );
}

#[tokio::test]
async fn test_enrichment_writes_sidecars() {
    let tmp = tempfile::tempdir().unwrap();
    let mut item = movie(1, "u1", "Rich Movie", Some(2020), "Action");
    item.tmdb_id = Some(550);
    let src = StubSource { movies: vec![item], ..Default::default() };

    let cache = ListingCache::new(tmp.path().join("cache")).unwrap();
    let r = Reconciler::new(
        Box::new(src),
        cache,
        Some(Arc::new(StubProvider)),
        options(tmp.path(), true, true),
    );
    r.export_account(&account()).await.unwrap();

    let folder = tmp.path().join("Movies/Action/Rich Movie (2020)");
    let nfo = std::fs::read_to_string(folder.join("Rich Movie (2020).nfo")).unwrap();
    assert!(nfo.contains("<plot>A stub plot.</plot>"));
    assert!(folder.join("poster.jpg").exists());
    assert!(folder.join("fanart.jpg").exists());
}

#[tokio::test]
async fn test_season_zero_bucket() {
    let tmp = tempfile::tempdir().unwrap();
    let series = CatalogItem {
        id: 7,
        playback_id: None,
        name: "Loose Show".to_string(),
        year: None,
        category: None,
        tmdb_id: None,
    };
    let mut episodes = HashMap::new();
    episodes.insert(
        7,
        vec![Episode {
            playback_id: Some("e9".to_string()),
            season: 0,
            episode: 0,
            title: String::new(),
        }],
    );
    let src = StubSource { series: vec![series], episodes, ..Default::default() };

    let mut opts = options(tmp.path(), true, true);
    opts.export_movies = false;
    opts.export_series = true;
    let r = reconciler(src, &tmp.path().join("cache"), opts);
    r.export_account(&account()).await.unwrap();

    let marker = tmp
        .path()
        .join("Series/Uncategorized/Loose Show/Season 00/S00.strm");
    assert!(marker.exists());
}
