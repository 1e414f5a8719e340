use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use std::sync::Arc;
use vod_export_core::{ExportOptions, ListingCache, Reconciler};
use vod_export_sources::{filter_accounts, parse_patterns, CatalogSource, TmdbClient};

pub struct ExportArgs {
    pub movies: bool,
    pub series: bool,
    pub refresh: bool,
    pub delete_old: bool,
    pub accounts: Option<String>,
}

pub async fn run_export(args: ExportArgs, output: &Output) -> Result<()> {
    let (paths, config, creds) = super::load_setup()?;
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create state directories: {}", e))?;

    let patterns = match &args.accounts {
        Some(raw) => parse_patterns(raw),
        None => config.export.accounts.clone(),
    };

    let client = super::connect(&config, &creds).await?;
    let accounts = client
        .list_accounts()
        .await
        .map_err(|e| eyre!("Failed to list accounts: {}", e))?;
    let accounts = filter_accounts(accounts, &patterns);
    if accounts.is_empty() {
        output.warn("No accounts match the configured patterns");
        return Ok(());
    }

    let enrichment = if config.tmdb_enabled() {
        match creds.get_tmdb_api_key() {
            Some(key) => {
                let provider = TmdbClient::new(key.clone(), paths.cache_tmdb_dir())
                    .map_err(|e| eyre!("Failed to set up TMDB client: {}", e))?;
                Some(Arc::new(provider) as Arc<dyn vod_export_sources::EnrichmentProvider>)
            }
            None => {
                output.warn("TMDB enrichment enabled but no API key stored. Run 'vod2strm config tmdb'. Continuing without enrichment.");
                None
            }
        }
    } else {
        None
    };

    // No kind flag means both kinds.
    let both = !args.movies && !args.series;
    let options = ExportOptions {
        movies_dir: config.export.movies_dir.clone(),
        series_dir: config.export.series_dir.clone(),
        export_movies: args.movies || both,
        export_series: args.series || both,
        delete_old: args.delete_old || config.export.delete_old,
        refresh: args.refresh,
        component_limit: config.export.component_limit,
    };

    let cache = ListingCache::new(paths.cache_listings_dir())
        .map_err(|e| eyre!("Failed to open listing cache: {}", e))?;
    let reconciler = Reconciler::new(Box::new(client), cache, enrichment, options);

    let mut failures = 0usize;
    for account in &accounts {
        match reconciler.export_account(account).await {
            Ok(summary) => {
                output.success(format!(
                    "{}: movies {} added / {} updated / {} removed / {} active, series {} added / {} updated / {} removed / {} active",
                    account.display_name(),
                    summary.movies.added,
                    summary.movies.updated,
                    summary.movies.removed,
                    summary.movies.active,
                    summary.series.added,
                    summary.series.updated,
                    summary.series.removed,
                    summary.series.active,
                ));
                output.json(&json!({
                    "account": account.display_name(),
                    "movies": {
                        "added": summary.movies.added,
                        "updated": summary.movies.updated,
                        "removed": summary.movies.removed,
                        "active": summary.movies.active,
                        "skipped": summary.movies.skipped,
                    },
                    "series": {
                        "added": summary.series.added,
                        "updated": summary.series.updated,
                        "removed": summary.series.removed,
                        "active": summary.series.active,
                        "skipped": summary.series.skipped,
                    },
                }));
            }
            Err(e) => {
                // One account failing does not stop the others.
                failures += 1;
                output.error(format!("{}: export failed: {:#}", account.display_name(), e));
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{} account(s) failed to export", failures));
    }
    Ok(())
}
