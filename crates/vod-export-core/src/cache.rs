use crate::sanitize::safe_account_name;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use vod_export_models::{Account, CatalogItem, Episode};

/// Durable per-account listing cache.
///
/// Layout: `<base>/<account-name>/movies.json`, `series.json`, and
/// `series_<id>.json` per episode listing. Entries never expire; they are
/// replaced on successful remote fetch and removed only by an explicit
/// clear. Only listings known to be complete are written, so a cache hit
/// may be treated as a complete listing.
#[derive(Clone)]
pub struct ListingCache {
    base_dir: PathBuf,
}

impl ListingCache {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn entry_path(&self, account: &Account, entry: &str) -> PathBuf {
        self.base_dir
            .join(safe_account_name(&account.display_name()))
            .join(format!("{entry}.json"))
    }

    pub fn load_movies(&self, account: &Account) -> Option<Vec<CatalogItem>> {
        self.load_entry(account, "movies")
    }

    pub fn save_movies(&self, account: &Account, data: &[CatalogItem]) -> Result<()> {
        self.save_entry(account, "movies", data)
    }

    pub fn load_series(&self, account: &Account) -> Option<Vec<CatalogItem>> {
        self.load_entry(account, "series")
    }

    pub fn save_series(&self, account: &Account, data: &[CatalogItem]) -> Result<()> {
        self.save_entry(account, "series", data)
    }

    pub fn load_episodes(&self, account: &Account, series_id: u64) -> Option<Vec<Episode>> {
        self.load_entry(account, &format!("series_{series_id}"))
    }

    pub fn save_episodes(&self, account: &Account, series_id: u64, data: &[Episode]) -> Result<()> {
        self.save_entry(account, &format!("series_{series_id}"), data)
    }

    fn load_entry<T>(&self, account: &Account, entry: &str) -> Option<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let path = self.entry_path(account, entry);

        if !path.exists() {
            debug!("Cache miss: {} {} (file does not exist)", account.display_name(), entry);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<T>>(&content) {
                Ok(data) => {
                    info!(
                        "Cache hit: {} {} (loaded {} items)",
                        account.display_name(),
                        entry,
                        data.len()
                    );
                    Some(data)
                }
                Err(e) => {
                    warn!(
                        "Cache corruption detected for {} {}: {}. Deleting corrupted file.",
                        account.display_name(),
                        entry,
                        e
                    );
                    if let Err(rm_err) = std::fs::remove_file(&path) {
                        warn!("Failed to delete corrupted cache file: {}", rm_err);
                    }
                    None
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read cache file for {} {}: {}",
                    account.display_name(),
                    entry,
                    e
                );
                None
            }
        }
    }

    fn save_entry<T>(&self, account: &Account, entry: &str, data: &[T]) -> Result<()>
    where
        T: Serialize,
    {
        let path = self.entry_path(account, entry);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| anyhow!("Failed to serialize cache: {}", e))?;
        std::fs::write(&path, json)
            .map_err(|e| anyhow!("Failed to write cache: {}", e))?;

        debug!(
            "Cache saved: {} {} ({} items)",
            account.display_name(),
            entry,
            data.len()
        );
        Ok(())
    }

    /// Drop every cached listing for one account.
    pub fn clear_account(&self, account: &Account) -> Result<()> {
        let dir = self.base_dir.join(safe_account_name(&account.display_name()));
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
            info!("Cleared listing cache for {}", account.display_name());
        }
        Ok(())
    }

    /// Drop the whole listing cache.
    pub fn clear_all(&self) -> Result<()> {
        if self.base_dir.exists() {
            std::fs::remove_dir_all(&self.base_dir)?;
            std::fs::create_dir_all(&self.base_dir)?;
            info!("Cleared listing cache directory: {:?}", self.base_dir);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: 1,
            name: "Acme TV".to_string(),
            server_url: None,
        }
    }

    fn item(id: u64, name: &str) -> CatalogItem {
        CatalogItem {
            id,
            playback_id: Some(format!("uuid-{id}")),
            name: name.to_string(),
            year: Some(2020),
            category: None,
            tmdb_id: None,
        }
    }

    #[test]
    fn test_round_trip_and_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ListingCache::new(dir.path().to_path_buf()).unwrap();
        let acc = account();

        assert!(cache.load_movies(&acc).is_none());

        let movies = vec![item(1, "One"), item(2, "Two")];
        cache.save_movies(&acc, &movies).unwrap();
        assert_eq!(cache.load_movies(&acc), Some(movies));

        // Entry namespace keeps kinds separate.
        assert!(cache.load_series(&acc).is_none());
    }

    #[test]
    fn test_corrupt_entry_is_miss_and_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ListingCache::new(dir.path().to_path_buf()).unwrap();
        let acc = account();

        cache.save_movies(&acc, &[item(1, "One")]).unwrap();
        let path = cache.entry_path(&acc, "movies");
        std::fs::write(&path, "{broken").unwrap();

        assert!(cache.load_movies(&acc).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_account_and_all() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ListingCache::new(dir.path().to_path_buf()).unwrap();
        let acc = account();

        cache.save_movies(&acc, &[item(1, "One")]).unwrap();
        cache.save_episodes(&acc, 9, &[]).unwrap();

        cache.clear_account(&acc).unwrap();
        assert!(cache.load_movies(&acc).is_none());
        assert!(cache.load_episodes(&acc, 9).is_none());

        cache.save_series(&acc, &[item(3, "Show")]).unwrap();
        cache.clear_all().unwrap();
        assert!(cache.load_series(&acc).is_none());
        assert!(dir.path().exists());
    }
}
