use thiserror::Error;

/// Errors raised while running an Instagram scrape through Apify.
///
/// Every variant is a distinct failure reason; none of them is retried.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Apify rejected the API token (HTTP 401/403).
    #[error("scraping service rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Apify answered with another non-2xx status.
    #[error("scraping service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The actor run reached a terminal non-success status.
    #[error("scrape run {run_id} ended with status {status}")]
    RunFailed { run_id: String, status: String },

    /// The run succeeded but produced no dataset items.
    #[error("no Instagram data found for {target}")]
    EmptyDataset { target: String },

    /// The actor returned an item describing its own failure
    /// (e.g. `{"error": "not_found"}` for an unknown profile).
    #[error("Instagram data unavailable for {target}: {message}")]
    ItemError { target: String, message: String },

    /// The overall scrape deadline elapsed.
    #[error("scrape did not finish within {secs}s")]
    TimedOut { secs: u64 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl ScrapeError {
    /// `true` for failures that indicate a broken pipeline rather than a
    /// reportable scrape outcome. Route handlers answer these with a 500.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            ScrapeError::Http(_) | ScrapeError::Deserialize { .. } | ScrapeError::InvalidBaseUrl { .. }
        )
    }
}

/// Errors raised by the image proxy.
#[derive(Debug, Error)]
pub enum ImageProxyError {
    #[error("missing url parameter")]
    MissingUrl,

    #[error("invalid url parameter: {reason}")]
    InvalidUrl { reason: String },

    #[error("host not allowed: {host}")]
    HostNotAllowed { host: String },

    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
