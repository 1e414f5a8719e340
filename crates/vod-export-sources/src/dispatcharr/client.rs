use crate::dispatcharr::{api, normalize};
use crate::error::SourceError;
use crate::traits::CatalogSource;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use vod_export_models::{Account, CatalogItem, Episode, Listing};

const MAX_PAGES: usize = 500;

/// Catalog source backed by the Dispatcharr HTTP API.
///
/// Playback references are proxy URLs on the Dispatcharr host, so the
/// media server streams through it rather than hitting the upstream
/// provider directly.
pub struct DispatcharrClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    page_size: usize,
    timeout: Duration,
    token: Option<String>,
}

impl DispatcharrClient {
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        page_size: usize,
        timeout_secs: u64,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            page_size,
            timeout: Duration::from_secs(timeout_secs),
            token: None,
        })
    }

    fn token(&self) -> Result<&str, SourceError> {
        self.token
            .as_deref()
            .ok_or_else(|| SourceError::Auth("not authenticated".to_string()))
    }

    /// Host portion of the base URL, without scheme or trailing slashes,
    /// used to build `http://<host>/proxy/...` playback URLs.
    fn proxy_host(&self) -> String {
        let mut host = self.base_url.as_str();
        let lower = host.to_ascii_lowercase();
        if lower.starts_with("https://") {
            host = &host[8..];
        } else if lower.starts_with("http://") {
            host = &host[7..];
        }
        host.trim_matches('/').to_string()
    }

    async fn list_items(
        &self,
        account: &Account,
        path: &str,
    ) -> Result<Listing<CatalogItem>, SourceError> {
        let token = self.token()?;
        let base_params = [("m3u_account", account.id.to_string())];

        let raw = api::paginate(
            &self.http,
            &self.base_url,
            token,
            path,
            &base_params,
            self.page_size,
            MAX_PAGES,
            self.timeout,
        )
        .await?;

        debug!(
            "{} for '{}': {} row(s), complete={}",
            path,
            account.display_name(),
            raw.len(),
            raw.complete
        );

        let rows = raw.rows.iter().map(normalize::catalog_item).collect();
        Ok(Listing {
            rows,
            complete: raw.complete,
        })
    }
}

#[async_trait]
impl CatalogSource for DispatcharrClient {
    fn source_name(&self) -> &str {
        "dispatcharr"
    }

    async fn authenticate(&mut self) -> Result<(), SourceError> {
        let url = format!("{}/api/accounts/token/", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await
            .map_err(|e| SourceError::Http {
                url: url.clone(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Auth(format!(
                "login returned HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        let body: Value = resp.json().await.map_err(|e| SourceError::Decode {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        match body.get("access").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => {
                self.token = Some(token.to_string());
                info!("Authenticated to Dispatcharr API");
                Ok(())
            }
            _ => Err(SourceError::Auth(
                "login succeeded but no 'access' token in response".to_string(),
            )),
        }
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, SourceError> {
        let token = self.token()?;
        let data = api::get_json(
            &self.http,
            &self.base_url,
            token,
            "/api/m3u/accounts/",
            &[],
            self.timeout,
        )
        .await?;

        let accounts = api::extract_rows(&data)
            .iter()
            .map(|row| Account {
                id: row.get("id").and_then(Value::as_u64).unwrap_or(0),
                name: row
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                server_url: row
                    .get("server_url")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect();

        Ok(accounts)
    }

    async fn list_movies(&self, account: &Account) -> Result<Listing<CatalogItem>, SourceError> {
        self.list_items(account, "/api/vod/movies/").await
    }

    async fn list_series(&self, account: &Account) -> Result<Listing<CatalogItem>, SourceError> {
        self.list_items(account, "/api/vod/series/").await
    }

    async fn list_episodes(
        &self,
        account: &Account,
        series_id: u64,
    ) -> Result<Listing<Episode>, SourceError> {
        let token = self.token()?;
        let path = format!("/api/vod/series/{}/provider-info/", series_id);
        let params = [("include_episodes", "true".to_string())];

        // Provider-info responses can be large; give them extra headroom.
        let info = api::get_json(
            &self.http,
            &self.base_url,
            token,
            &path,
            &params,
            self.timeout * 2,
        )
        .await?;

        debug!(
            "provider-info for series {} ({}): fetched",
            series_id,
            account.display_name()
        );

        // Single-shot query: a response we got is a complete episode set.
        Ok(Listing::complete(normalize::episodes(&info)))
    }

    fn movie_url(&self, playback_id: &str) -> String {
        format!("http://{}/proxy/vod/movie/{}", self.proxy_host(), playback_id)
    }

    fn episode_url(&self, playback_id: &str) -> String {
        format!("http://{}/proxy/vod/episode/{}", self.proxy_host(), playback_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> DispatcharrClient {
        DispatcharrClient::new(base, "admin", "secret", 100, 30).unwrap()
    }

    #[test]
    fn test_proxy_host_strips_scheme_and_slashes() {
        assert_eq!(client("http://127.0.0.1:9191/").proxy_host(), "127.0.0.1:9191");
        assert_eq!(client("HTTPS://host.example/").proxy_host(), "host.example");
        assert_eq!(client("host.example").proxy_host(), "host.example");
    }

    #[test]
    fn test_playback_urls() {
        let c = client("https://dispatch.local");
        assert_eq!(
            c.movie_url("abc-123"),
            "http://dispatch.local/proxy/vod/movie/abc-123"
        );
        assert_eq!(
            c.episode_url("def-456"),
            "http://dispatch.local/proxy/vod/episode/def-456"
        );
    }

    #[test]
    fn test_unauthenticated_token_is_error() {
        let c = client("http://host");
        assert!(matches!(c.token(), Err(SourceError::Auth(_))));
    }
}
