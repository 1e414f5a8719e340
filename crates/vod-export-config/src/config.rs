use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
}

/// Catalog API connection settings. The password lives in the credential
/// store, not here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub username: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportConfig {
    /// Movies output root; `{XC_NAME}` is replaced with the account name.
    #[serde(default = "default_movies_dir")]
    pub movies_dir: String,
    /// Series output root; `{XC_NAME}` is replaced with the account name.
    #[serde(default = "default_series_dir")]
    pub series_dir: String,
    /// Remove marker files no longer present in the remote listing.
    #[serde(default)]
    pub delete_old: bool,
    /// Maximum length of any produced path component, in characters.
    #[serde(default = "default_component_limit")]
    pub component_limit: usize,
    /// Account name patterns, SQL LIKE style ('%' any run, '_' one char).
    /// A bare "%" selects all accounts.
    #[serde(default = "default_account_patterns")]
    pub accounts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TmdbConfig {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    250
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_movies_dir() -> String {
    "/mnt/Share-VOD/{XC_NAME}/Movies".to_string()
}

fn default_series_dir() -> String {
    "/mnt/Share-VOD/{XC_NAME}/Series".to_string()
}

fn default_component_limit() -> usize {
    80
}

fn default_account_patterns() -> Vec<String> {
    vec!["%".to_string()]
}

fn default_interval_minutes() -> u64 {
    360
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            movies_dir: default_movies_dir(),
            series_dir: default_series_dir(),
            delete_old: false,
            component_limit: default_component_limit(),
            accounts: default_account_patterns(),
        }
    }
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        interval_minutes: default_interval_minutes(),
        run_on_startup: default_true(),
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.is_empty() {
            return Err(anyhow::anyhow!("api.base_url must not be empty"));
        }
        if self.api.username.is_empty() {
            return Err(anyhow::anyhow!("api.username must not be empty"));
        }
        if self.api.page_size == 0 {
            return Err(anyhow::anyhow!("api.page_size must be at least 1"));
        }
        // Shortening keeps a prefix plus an ellipsis and a 7-char tail, so
        // anything shorter produces unusable components.
        if self.export.component_limit < 20 {
            return Err(anyhow::anyhow!("export.component_limit must be at least 20"));
        }
        if self.export.accounts.is_empty() {
            return Err(anyhow::anyhow!("export.accounts must not be empty"));
        }
        if let Some(scheduler) = &self.scheduler {
            if scheduler.interval_minutes == 0 {
                return Err(anyhow::anyhow!("scheduler.interval_minutes must be at least 1"));
            }
        }
        Ok(())
    }

    pub fn tmdb_enabled(&self) -> bool {
        self.tmdb.as_ref().map(|t| t.enabled).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_config() -> Config {
        Config {
            api: ApiConfig {
                base_url: "http://127.0.0.1:9191".to_string(),
                username: "admin".to_string(),
                page_size: default_page_size(),
                timeout_secs: default_timeout_secs(),
            },
            export: ExportConfig::default(),
            tmdb: Some(TmdbConfig { enabled: true }),
            scheduler: None,
        }
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let config = sample_config();

        let path = file.path().to_path_buf();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.api.base_url, "http://127.0.0.1:9191");
        assert_eq!(loaded.api.username, "admin");
        assert_eq!(loaded.export.component_limit, 80);
        assert_eq!(loaded.export.accounts, vec!["%".to_string()]);
        assert!(loaded.tmdb_enabled());
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let parsed: Config = toml::from_str(
            r#"
            [api]
            base_url = "http://host:9191"
            username = "admin"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.api.page_size, 250);
        assert_eq!(parsed.export.movies_dir, "/mnt/Share-VOD/{XC_NAME}/Movies");
        assert!(!parsed.export.delete_old);
        assert!(!parsed.tmdb_enabled());
    }

    #[test]
    fn test_config_validate() {
        let mut config = sample_config();
        assert!(config.validate().is_ok());

        config.api.base_url = String::new();
        assert!(config.validate().is_err());

        config.api.base_url = "http://host".to_string();
        config.export.component_limit = 10;
        assert!(config.validate().is_err());

        config.export.component_limit = 80;
        config.export.accounts.clear();
        assert!(config.validate().is_err());
    }
}
