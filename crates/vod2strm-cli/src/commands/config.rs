use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use std::io::{self, BufRead, Write};
use vod_export_config::{ApiConfig, Config, CredentialStore, ExportConfig, PathManager, TmdbConfig};

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show(full, output),
        ConfigCommands::Api { base_url, username } => configure_api(base_url, username, output),
        ConfigCommands::Tmdb { enabled } => configure_tmdb(enabled, output),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn mask(present: bool, full: bool, value: Option<&String>) -> String {
    match (present, full) {
        (false, _) => "(not set)".to_string(),
        (true, false) => "********".to_string(),
        (true, true) => value.cloned().unwrap_or_default(),
    }
}

fn show(full: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config_file = paths.config_file();

    if !config_file.exists() {
        output.warn(format!(
            "No configuration found at {}. Run 'vod2strm config api' to create one.",
            config_file.display()
        ));
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load configuration: {}", e))?;
    let mut creds = CredentialStore::new(paths.credentials_file());
    creds
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    output.info(format!("Configuration: {}", config_file.display()));
    output.info(format!("  api.base_url       = {}", config.api.base_url));
    output.info(format!("  api.username       = {}", config.api.username));
    output.info(format!("  api.page_size      = {}", config.api.page_size));
    output.info(format!("  api.timeout_secs   = {}", config.api.timeout_secs));
    output.info(format!(
        "  api password       = {}",
        mask(creds.get_api_password().is_some(), full, creds.get_api_password())
    ));
    output.info(format!("  export.movies_dir  = {}", config.export.movies_dir));
    output.info(format!("  export.series_dir  = {}", config.export.series_dir));
    output.info(format!("  export.delete_old  = {}", config.export.delete_old));
    output.info(format!("  export.accounts    = {:?}", config.export.accounts));
    output.info(format!("  tmdb.enabled       = {}", config.tmdb_enabled()));
    output.info(format!(
        "  tmdb api key       = {}",
        mask(creds.get_tmdb_api_key().is_some(), full, creds.get_tmdb_api_key())
    ));

    output.json(&json!({
        "config_file": config_file.display().to_string(),
        "api": {
            "base_url": config.api.base_url,
            "username": config.api.username,
            "page_size": config.api.page_size,
            "timeout_secs": config.api.timeout_secs,
            "password_set": creds.get_api_password().is_some(),
        },
        "export": {
            "movies_dir": config.export.movies_dir,
            "series_dir": config.export.series_dir,
            "delete_old": config.export.delete_old,
            "accounts": config.export.accounts,
        },
        "tmdb": {
            "enabled": config.tmdb_enabled(),
            "api_key_set": creds.get_tmdb_api_key().is_some(),
        },
    }));

    Ok(())
}

/// Load the existing config, or start from defaults so a first `config api`
/// run produces a complete file.
fn load_or_default(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    if config_file.exists() {
        return Config::load_from_file(&config_file)
            .map_err(|e| eyre!("Failed to load configuration: {}", e));
    }
    Ok(Config {
        api: ApiConfig {
            base_url: String::new(),
            username: String::new(),
            page_size: 250,
            timeout_secs: 60,
        },
        export: ExportConfig::default(),
        tmdb: None,
        scheduler: None,
    })
}

fn configure_api(
    base_url: Option<String>,
    username: Option<String>,
    output: &Output,
) -> Result<()> {
    let paths = PathManager::default();
    let mut config = load_or_default(&paths)?;

    config.api.base_url = match base_url {
        Some(url) => url,
        None => prompt("Dispatcharr base URL (e.g. http://127.0.0.1:9191)")?,
    };
    config.api.username = match username {
        Some(name) => name,
        None => prompt("API username")?,
    };

    let password = rpassword::prompt_password("API password: ")
        .map_err(|e| eyre!("Failed to read password: {}", e))?;

    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration: {}", e))?;
    config
        .save_to_file(&paths.config_file())
        .map_err(|e| eyre!("Failed to save configuration: {}", e))?;

    let mut creds = CredentialStore::new(paths.credentials_file());
    creds
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    creds.set_api_password(password);
    creds
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;

    output.success(format!(
        "API configuration saved to {}",
        paths.config_file().display()
    ));
    Ok(())
}

fn configure_tmdb(enabled: Option<bool>, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let mut config = load_or_default(&paths)?;

    let enabled = match enabled {
        Some(v) => v,
        None => prompt("Enable TMDB enrichment? [y/N]")?.eq_ignore_ascii_case("y"),
    };
    config.tmdb = Some(TmdbConfig { enabled });

    if enabled {
        let mut creds = CredentialStore::new(paths.credentials_file());
        creds
            .load()
            .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

        if creds.get_tmdb_api_key().is_none() {
            let key = rpassword::prompt_password("TMDB API key (v3): ")
                .map_err(|e| eyre!("Failed to read API key: {}", e))?;
            if key.is_empty() {
                return Err(eyre!("TMDB API key must not be empty when enrichment is enabled"));
            }
            creds.set_tmdb_api_key(key);
            creds
                .save()
                .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
        }
    }

    config
        .save_to_file(&paths.config_file())
        .map_err(|e| eyre!("Failed to save configuration: {}", e))?;

    output.success(format!(
        "TMDB enrichment {}",
        if enabled { "enabled" } else { "disabled" }
    ));
    Ok(())
}
