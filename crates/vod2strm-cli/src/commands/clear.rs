use crate::output::Output;
use color_eyre::Result;
use std::fs;
use vod_export_config::PathManager;
use vod_export_core::ListingCache;

pub async fn run_clear(all: bool, cache: bool, credentials: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();

    if all {
        clear_cache(&paths, output);
        clear_credentials(&paths, output)?;
        output.success("All caches and credentials cleared");
        return Ok(());
    }

    let mut cleared_anything = false;

    if cache {
        clear_cache(&paths, output);
        cleared_anything = true;
    }

    if credentials {
        clear_credentials(&paths, output)?;
        cleared_anything = true;
    }

    if !cleared_anything {
        output.warn("No clear option specified. Use --cache, --credentials, or --all");
        output.info("\nExample: vod2strm clear --cache");
    }

    Ok(())
}

fn clear_cache(paths: &PathManager, output: &Output) {
    match ListingCache::new(paths.cache_listings_dir()) {
        Ok(cache) => match cache.clear_all() {
            Ok(()) => output.success(format!(
                "Cleared listing cache: {}",
                paths.cache_listings_dir().display()
            )),
            Err(e) => output.warn(format!("Failed to clear listing cache: {}", e)),
        },
        Err(e) => output.warn(format!("Failed to open listing cache: {}", e)),
    }

    let tmdb_dir = paths.cache_tmdb_dir();
    if tmdb_dir.exists() {
        match fs::remove_dir_all(&tmdb_dir) {
            Ok(()) => output.success(format!("Cleared enrichment cache: {}", tmdb_dir.display())),
            Err(e) => output.warn(format!("Failed to clear enrichment cache: {}", e)),
        }
    } else {
        output.info("No enrichment cache found to clear");
    }
}

fn clear_credentials(paths: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = paths.credentials_file();

    if credentials_file.exists() {
        fs::remove_file(&credentials_file).map_err(|e| {
            color_eyre::eyre::eyre!(
                "Failed to remove credentials file at {}: {}",
                credentials_file.display(),
                e
            )
        })?;
        output.success(format!("Cleared credentials: {}", credentials_file.display()));
    } else {
        output.info("No credentials file found to clear");
    }

    Ok(())
}
