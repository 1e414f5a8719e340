//! TMDB (The Movie Database) enrichment provider.
//!
//! Uses TMDB API v3: https://developer.themoviedb.org/docs
//!
//! Lookup and search responses are cached on disk so a re-run enriches
//! from cache instead of re-hitting the API; remote calls are spaced out
//! by a minimum interval to respect third-party rate limits. The throttle
//! is internal to this client and never blocks marker writing.

use crate::error::EnrichError;
use crate::traits::{EnrichmentProvider, ImageVariant};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use vod_export_models::{EnrichmentRecord, MediaKind};

const BASE_URL: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(250);

pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
    cache_dir: PathBuf,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl TmdbClient {
    pub fn new(api_key: String, cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            cache_dir,
            min_interval: DEFAULT_MIN_INTERVAL,
            last_call: Mutex::new(None),
        })
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    fn kind_path(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }

    /// Enforce minimum spacing between remote calls.
    async fn throttle(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// GET returning parsed JSON; 404 maps to `Ok(None)` (item unknown to
    /// the provider), other non-success statuses are provider errors.
    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, EnrichError> {
        self.throttle().await;

        let url = format!("{BASE_URL}{path}");
        debug!("TMDB request {}", url);

        let resp = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(EnrichError::Provider(format!(
                "TMDB returned {} for {}",
                resp.status(),
                path
            )));
        }

        let body = resp
            .json()
            .await
            .map_err(|e| EnrichError::Provider(format!("parse JSON: {e}")))?;
        Ok(Some(body))
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{name}.json"))
    }

    fn load_cached(&self, name: &str) -> Option<Value> {
        let path = self.cache_path(name);
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(value) => {
                    debug!("TMDB cache hit: {}", name);
                    Some(value)
                }
                Err(e) => {
                    warn!("Corrupt TMDB cache entry {}: {}. Deleting.", name, e);
                    if let Err(rm_err) = std::fs::remove_file(&path) {
                        warn!("Failed to delete corrupt cache file: {}", rm_err);
                    }
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read TMDB cache entry {}: {}", name, e);
                None
            }
        }
    }

    fn store_cached(&self, name: &str, value: &Value) {
        let path = self.cache_path(name);
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!("Failed to write TMDB cache entry {}: {}", name, e);
                }
            }
            Err(e) => warn!("Failed to serialize TMDB cache entry {}: {}", name, e),
        }
    }

    /// Cached GET: disk first, remote on miss, successful responses stored.
    async fn get_json_cached(
        &self,
        cache_name: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, EnrichError> {
        if let Some(cached) = self.load_cached(cache_name) {
            return Ok(Some(cached));
        }
        let fetched = self.get_json(path, params).await?;
        if let Some(ref value) = fetched {
            self.store_cached(cache_name, value);
        }
        Ok(fetched)
    }
}

fn year_of(data: &Value) -> Option<u16> {
    ["release_date", "first_air_date", "air_date"]
        .iter()
        .find_map(|k| data.get(*k))
        .and_then(Value::as_str)
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse().ok())
}

fn record_from(data: &Value) -> EnrichmentRecord {
    EnrichmentRecord {
        tmdb_id: data.get("id").and_then(Value::as_u64).and_then(|n| u32::try_from(n).ok()),
        title: data
            .get("title")
            .or_else(|| data.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        year: year_of(data),
        overview: data
            .get("overview")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        rating: data.get("vote_average").and_then(Value::as_f64),
        votes: data.get("vote_count").and_then(Value::as_u64),
        poster: data
            .get("poster_path")
            .and_then(Value::as_str)
            .map(str::to_string),
        backdrop: data
            .get("backdrop_path")
            .and_then(Value::as_str)
            .map(str::to_string),
        still: data
            .get("still_path")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Pick a search result: exact year match wins, otherwise the first result.
fn pick_result(results: &[Value], year: Option<u16>) -> Option<EnrichmentRecord> {
    if results.is_empty() {
        return None;
    }
    if let Some(wanted) = year {
        if let Some(hit) = results.iter().find(|r| year_of(r) == Some(wanted)) {
            return Some(record_from(hit));
        }
    }
    results.first().map(record_from)
}

/// Filename-safe slug for search cache entries.
fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

#[async_trait]
impl EnrichmentProvider for TmdbClient {
    fn provider_name(&self) -> &str {
        "tmdb"
    }

    async fn lookup(
        &self,
        kind: MediaKind,
        id: u32,
    ) -> Result<Option<EnrichmentRecord>, EnrichError> {
        let kind_path = Self::kind_path(kind);
        let cache_name = format!("{kind_path}_{id}");
        let data = self
            .get_json_cached(&cache_name, &format!("/{kind_path}/{id}"), &[])
            .await?;
        Ok(data.map(|d| record_from(&d)))
    }

    async fn search(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> Result<Option<EnrichmentRecord>, EnrichError> {
        let kind_path = Self::kind_path(kind);
        let year_param = match kind {
            MediaKind::Movie => "year",
            MediaKind::Series => "first_air_date_year",
        };

        let mut params = vec![("query", title.to_string())];
        if let Some(y) = year {
            params.push((year_param, y.to_string()));
        }

        let cache_name = format!(
            "search_{}_{}_{}",
            kind_path,
            slug(title),
            year.map(|y| y.to_string()).unwrap_or_else(|| "any".to_string())
        );

        let data = self
            .get_json_cached(&cache_name, &format!("/search/{kind_path}"), &params)
            .await?;

        let results = data
            .as_ref()
            .and_then(|d| d.get("results"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(pick_result(&results, year))
    }

    async fn lookup_episode(
        &self,
        series_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<Option<EnrichmentRecord>, EnrichError> {
        let cache_name = format!("tv_{series_id}_s{season:02}e{episode:02}");
        let path = format!("/tv/{series_id}/season/{season}/episode/{episode}");
        let data = self.get_json_cached(&cache_name, &path, &[]).await?;
        Ok(data.map(|d| record_from(&d)))
    }

    async fn image(
        &self,
        image_ref: &str,
        variant: ImageVariant,
    ) -> Result<Option<Vec<u8>>, EnrichError> {
        let size = match variant {
            ImageVariant::Poster => "w500",
            ImageVariant::Backdrop => "w1280",
            ImageVariant::Still => "w300",
        };

        self.throttle().await;

        let url = format!("{IMAGE_BASE}/{size}{image_ref}");
        debug!("TMDB image request {}", url);

        let resp = self.http.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(EnrichError::Provider(format!(
                "TMDB image returned {}",
                resp.status()
            )));
        }

        let bytes = resp.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }
}
