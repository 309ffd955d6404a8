//! HTTP client for the Apify REST API (v2).
//!
//! Covers the three calls a scrape needs: start an actor run, long-poll it to
//! a terminal status, and list the run's dataset. Authentication failures and
//! other non-2xx statuses surface as distinct [`ScrapeError`] variants.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ScrapeError;
use crate::types::{ApiResponse, RunData, RunStatus};

pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

/// Default `waitForFinish` window for each poll, in seconds (Apify caps it at 60).
pub const DEFAULT_RUN_WAIT_SECS: u64 = 60;

/// Client for the Apify platform API.
///
/// Use [`ApifyClient::new`] for production or [`ApifyClient::with_base_url`]
/// to point at a mock server in tests.
pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: Url,
    run_wait_secs: u64,
}

impl ApifyClient {
    /// Creates a client pointed at the production Apify API.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, ScrapeError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ScrapeError::InvalidBaseUrl`] if
    /// `base_url` is not a valid absolute URL.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("advize/0.1 (instagram-scrape)")
            .build()?;

        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            ScrapeError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: e.to_string(),
            }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ScrapeError::InvalidBaseUrl {
                base_url: base_url.to_string(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
            run_wait_secs: DEFAULT_RUN_WAIT_SECS,
        })
    }

    /// Overrides the `waitForFinish` window used while polling a run.
    #[must_use]
    pub fn with_run_wait_secs(mut self, secs: u64) -> Self {
        self.run_wait_secs = secs;
        self
    }

    /// Starts an actor run. Returns immediately with run metadata.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Unauthorized`] on HTTP 401/403.
    /// - [`ScrapeError::Api`] on any other non-2xx status.
    /// - [`ScrapeError::Http`] on network failure.
    /// - [`ScrapeError::Deserialize`] if the run metadata does not parse.
    pub async fn start_run<I: Serialize + ?Sized>(
        &self,
        actor_id: &str,
        input: &I,
    ) -> Result<RunData, ScrapeError> {
        let url = self.endpoint(&["acts", actor_id, "runs"]);
        let request = self.client.post(url).json(input);
        let envelope: ApiResponse<RunData> = self
            .send_json(request, &format!("start run of {actor_id}"))
            .await?;
        Ok(envelope.data)
    }

    /// Polls until a run reaches a terminal status, using `waitForFinish`
    /// long-polling so each request blocks server-side.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::RunFailed`] if the run ends in anything but `SUCCEEDED`.
    /// - Any error from the underlying request (see [`Self::start_run`]).
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData, ScrapeError> {
        loop {
            let mut url = self.endpoint(&["actor-runs", run_id]);
            url.query_pairs_mut()
                .append_pair("waitForFinish", &self.run_wait_secs.to_string());

            let envelope: ApiResponse<RunData> = self
                .send_json(self.client.get(url), &format!("run {run_id}"))
                .await?;
            let run = envelope.data;

            match run.status {
                RunStatus::Succeeded => return Ok(run),
                ref status if status.is_terminal() => {
                    return Err(ScrapeError::RunFailed {
                        run_id: run.id,
                        status: status.to_string(),
                    });
                }
                ref status => {
                    tracing::debug!(run_id, status = %status, "run still in progress");
                }
            }
        }
    }

    /// Fetches all items of a dataset as JSON.
    ///
    /// # Errors
    ///
    /// Any error from the underlying request (see [`Self::start_run`]).
    pub async fn list_dataset_items<T: DeserializeOwned>(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<T>, ScrapeError> {
        let mut url = self.endpoint(&["datasets", dataset_id, "items"]);
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("clean", "true");

        self.send_json(self.client.get(url), &format!("dataset {dataset_id}"))
            .await
    }

    /// Requests that a run be aborted. Used when the caller gives up on a run
    /// that is still consuming actor compute.
    ///
    /// # Errors
    ///
    /// Any error from the underlying request (see [`Self::start_run`]).
    pub async fn abort_run(&self, run_id: &str) -> Result<RunData, ScrapeError> {
        let url = self.endpoint(&["actor-runs", run_id, "abort"]);
        let envelope: ApiResponse<RunData> = self
            .send_json(self.client.post(url), &format!("abort run {run_id}"))
            .await?;
        Ok(envelope.data)
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, ScrapeError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ScrapeError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Api {
                status: status.as_u16(),
                message: truncate(&body, 500),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| ScrapeError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_owned(),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
