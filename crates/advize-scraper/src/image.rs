//! Re-fetching of Instagram/Facebook CDN images on behalf of browsers.
//!
//! The CDN rejects hotlinked requests that lack a browser `User-Agent` and an
//! Instagram `Referer`, so the proxy fetches the image itself with those
//! headers and hands the body back untouched. Only allow-listed hosts are
//! fetched.

use std::sync::Arc;
use std::time::Duration;

use advize_core::AppConfig;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, REFERER, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Url};

use crate::error::ImageProxyError;

const INSTAGRAM_REFERER: &str = "https://www.instagram.com/";
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
const MAX_REDIRECTS: usize = 5;

/// A successful upstream image response, body not yet read.
pub struct ProxiedImage {
    pub content_type: String,
    pub content_length: Option<u64>,
    response: reqwest::Response,
}

impl ProxiedImage {
    /// The upstream response, for streaming its body.
    #[must_use]
    pub fn into_upstream(self) -> reqwest::Response {
        self.response
    }
}

pub struct ImageProxy {
    client: Client,
    user_agent: String,
    allowed_hosts: Arc<[String]>,
}

/// `true` if `host` equals an allow-listed domain or is a subdomain of one.
fn host_matches(allowed_hosts: &[String], host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    allowed_hosts.iter().any(|allowed| {
        host == *allowed
            || host
                .strip_suffix(allowed.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

impl ImageProxy {
    /// Creates a proxy with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ImageProxyError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        allowed_hosts: Vec<String>,
    ) -> Result<Self, ImageProxyError> {
        let builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10));
        Self::with_client_builder(builder, user_agent, allowed_hosts)
    }

    /// Creates a proxy from a caller-supplied client builder (tests inject
    /// DNS overrides). The redirect policy is always replaced so every hop is
    /// checked against the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`ImageProxyError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_client_builder(
        builder: ClientBuilder,
        user_agent: &str,
        allowed_hosts: Vec<String>,
    ) -> Result<Self, ImageProxyError> {
        let allowed_hosts: Arc<[String]> = allowed_hosts
            .into_iter()
            .map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        let redirect_hosts = Arc::clone(&allowed_hosts);
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if attempt
                .url()
                .host_str()
                .is_some_and(|host| host_matches(&redirect_hosts, host))
            {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });

        Ok(Self {
            client: builder.redirect(policy).build()?,
            user_agent: user_agent.to_owned(),
            allowed_hosts,
        })
    }

    /// Builds a proxy from application config.
    ///
    /// # Errors
    ///
    /// Returns [`ImageProxyError::Http`] if the `reqwest::Client` cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ImageProxyError> {
        Self::new(
            config.proxy_timeout_secs,
            &config.proxy_user_agent,
            config.proxy_allowed_hosts.clone(),
        )
    }

    /// `true` if `host` equals an allow-listed domain or is a subdomain of one.
    #[must_use]
    pub fn is_allowed_host(&self, host: &str) -> bool {
        host_matches(&self.allowed_hosts, host)
    }

    /// Parses and checks the `url` query parameter.
    ///
    /// # Errors
    ///
    /// - [`ImageProxyError::MissingUrl`] if absent or blank.
    /// - [`ImageProxyError::InvalidUrl`] if not an absolute `http(s)` URL.
    /// - [`ImageProxyError::HostNotAllowed`] if the host is not allow-listed.
    pub fn validate(&self, raw: Option<&str>) -> Result<Url, ImageProxyError> {
        let raw = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ImageProxyError::MissingUrl)?;

        let url = Url::parse(raw).map_err(|e| ImageProxyError::InvalidUrl {
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ImageProxyError::InvalidUrl {
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let host = url.host_str().ok_or_else(|| ImageProxyError::InvalidUrl {
            reason: "URL has no host".to_owned(),
        })?;
        if !self.is_allowed_host(host) {
            return Err(ImageProxyError::HostNotAllowed {
                host: host.to_owned(),
            });
        }

        Ok(url)
    }

    /// Validates `raw` and fetches it with browser-like headers.
    ///
    /// # Errors
    ///
    /// - Any validation error from [`Self::validate`].
    /// - [`ImageProxyError::HostNotAllowed`] if a redirect leaves the allow-list.
    /// - [`ImageProxyError::UpstreamStatus`] if the CDN answers non-2xx.
    /// - [`ImageProxyError::Http`] on network failure.
    pub async fn fetch(&self, raw: Option<&str>) -> Result<ProxiedImage, ImageProxyError> {
        let url = self.validate(raw)?;

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(REFERER, INSTAGRAM_REFERER)
            .header(ACCEPT, IMAGE_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        // The redirect policy stops at the first hop outside the allow-list.
        if status.is_redirection() {
            let host = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|loc| response.url().join(loc).ok())
                .and_then(|url| url.host_str().map(ToOwned::to_owned))
                .unwrap_or_else(|| "unknown".to_owned());
            return Err(ImageProxyError::HostNotAllowed { host });
        }
        if !status.is_success() {
            return Err(ImageProxyError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        Ok(ProxiedImage {
            content_type,
            content_length,
            response,
        })
    }
}
