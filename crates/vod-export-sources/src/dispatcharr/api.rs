use crate::error::SourceError;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use vod_export_models::Listing;

/// Single GET request wrapper with bearer auth, query params, and a
/// per-request timeout.
pub(crate) async fn get_json(
    http: &reqwest::Client,
    base_url: &str,
    token: &str,
    path: &str,
    params: &[(&str, String)],
    timeout: Duration,
) -> Result<Value, SourceError> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), path);
    debug!("API GET {} params={:?}", url, params);

    let resp = http
        .get(&url)
        .bearer_auth(token)
        .query(params)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| SourceError::Http {
            url: url.clone(),
            source: e,
        })?;

    let status = resp.status();
    debug!("API GET {} -> {}", url, status);
    if !status.is_success() {
        return Err(SourceError::Status {
            url,
            status: status.as_u16(),
        });
    }

    resp.json().await.map_err(|e| SourceError::Decode {
        url,
        reason: e.to_string(),
    })
}

/// Pull the row array out of a list response body. Handles both the DRF
/// envelope (`{"count": .., "next": .., "results": [..]}`) and a bare
/// JSON array.
pub(crate) fn extract_rows(data: &Value) -> Vec<Value> {
    if let Some(results) = data.get("results").and_then(Value::as_array) {
        return results.clone();
    }
    data.as_array().cloned().unwrap_or_default()
}

/// Decide whether another page should be requested after this one.
///
/// A short page is always terminal; an envelope additionally signals the
/// end with a null `next` link.
pub(crate) fn has_next_page(data: &Value, rows_len: usize, page_size: usize) -> bool {
    if rows_len < page_size {
        return false;
    }
    if data.is_object() {
        return !data
            .get("next")
            .map(Value::is_null)
            .unwrap_or(true);
    }
    true
}

/// Generic paginator for list endpoints.
///
/// Requests pages sequentially starting at 1. A failure on the first page
/// is a listing failure; a failure on a later page keeps the rows already
/// collected and returns them marked partial, so the caller can still
/// write markers while suppressing destructive cleanup.
pub(crate) async fn paginate(
    http: &reqwest::Client,
    base_url: &str,
    token: &str,
    path: &str,
    base_params: &[(&str, String)],
    page_size: usize,
    max_pages: usize,
    timeout: Duration,
) -> Result<Listing<Value>, SourceError> {
    let mut all_rows = Vec::new();
    let mut page: usize = 1;

    loop {
        let mut params: Vec<(&str, String)> = base_params.to_vec();
        params.push(("page", page.to_string()));
        params.push(("page_size", page_size.to_string()));

        let data = match get_json(http, base_url, token, path, &params, timeout).await {
            Ok(data) => data,
            Err(e) if page == 1 => return Err(e),
            Err(e) => {
                warn!(
                    "Stopping pagination on {} at page {}: {} (keeping {} collected row(s))",
                    path,
                    page,
                    e,
                    all_rows.len()
                );
                return Ok(Listing::partial(all_rows));
            }
        };

        let rows = extract_rows(&data);
        debug!("{} page={}: got {} row(s)", path, page, rows.len());

        if rows.is_empty() {
            return Ok(Listing::complete(all_rows));
        }

        let more = has_next_page(&data, rows.len(), page_size);
        all_rows.extend(rows);

        if !more {
            return Ok(Listing::complete(all_rows));
        }

        page += 1;
        if page > max_pages {
            warn!("Reached max_pages={} for {}, stopping pagination", max_pages, path);
            // Truncated by the page cap; cannot be trusted as complete.
            return Ok(Listing::partial(all_rows));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_rows_envelope() {
        let data = json!({"count": 2, "next": null, "results": [{"id": 1}, {"id": 2}]});
        assert_eq!(extract_rows(&data).len(), 2);
    }

    #[test]
    fn test_extract_rows_bare_list() {
        let data = json!([{"id": 1}]);
        assert_eq!(extract_rows(&data).len(), 1);
    }

    #[test]
    fn test_extract_rows_unexpected_shape() {
        assert!(extract_rows(&json!({"detail": "oops"})).is_empty());
        assert!(extract_rows(&json!("nope")).is_empty());
    }

    #[test]
    fn test_has_next_page_short_page_is_terminal() {
        let data = json!({"next": "http://x/?page=2", "results": []});
        assert!(!has_next_page(&data, 10, 100));
    }

    #[test]
    fn test_has_next_page_envelope_next_link() {
        let more = json!({"next": "http://x/?page=2", "results": []});
        assert!(has_next_page(&more, 100, 100));

        let done = json!({"next": null, "results": []});
        assert!(!has_next_page(&done, 100, 100));

        let missing = json!({"results": []});
        assert!(!has_next_page(&missing, 100, 100));
    }

    #[test]
    fn test_has_next_page_bare_list_full_page() {
        let data = json!([]);
        assert!(has_next_page(&data, 100, 100));
        assert!(!has_next_page(&data, 99, 100));
    }
}
