use color_eyre::eyre::eyre;
use color_eyre::Result;
use vod_export_config::{Config, CredentialStore, PathManager};
use vod_export_sources::{CatalogSource, DispatcharrClient};

pub mod check;
pub mod clear;
pub mod config;
pub mod daemon;
pub mod export;

/// Load configuration and credentials, failing with a hint towards
/// `config api` when nothing is set up yet.
pub(crate) fn load_setup() -> Result<(PathManager, Config, CredentialStore)> {
    let paths = PathManager::default();
    let config_file = paths.config_file();
    if !config_file.exists() {
        return Err(eyre!(
            "No configuration found at {}. Run 'vod2strm config api' first.",
            config_file.display()
        ));
    }

    let cfg = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load configuration: {}", e))?;
    cfg.validate()
        .map_err(|e| eyre!("Invalid configuration: {}", e))?;

    let mut creds = CredentialStore::new(paths.credentials_file());
    creds
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    Ok((paths, cfg, creds))
}

/// Build and authenticate a Dispatcharr client from config + credentials.
pub(crate) async fn connect(config: &Config, creds: &CredentialStore) -> Result<DispatcharrClient> {
    let password = creds
        .get_api_password()
        .ok_or_else(|| eyre!("No API password stored. Run 'vod2strm config api' first."))?;

    let mut client = DispatcharrClient::new(
        &config.api.base_url,
        &config.api.username,
        password,
        config.api.page_size,
        config.api.timeout_secs,
    )
    .map_err(|e| eyre!("Failed to build API client: {}", e))?;

    client
        .authenticate()
        .await
        .map_err(|e| eyre!("Authentication failed: {}", e))?;

    Ok(client)
}
