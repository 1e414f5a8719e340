use thiserror::Error;

/// Failures at the catalog-source boundary.
///
/// An empty account is not an error; these only surface when a listing
/// could not be obtained at all.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Failures at the enrichment-provider boundary. These never abort a pass;
/// the reconciler degrades to marker-only output.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(String),
}
