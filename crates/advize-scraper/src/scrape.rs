//! Instagram scrape orchestration on top of [`ApifyClient`].
//!
//! A scrape is one actor run with `resultsLimit: 1`: start the run, wait
//! for it to finish, list its dataset, normalize the first item. There is
//! exactly one attempt per request; failures are returned, never retried.

use std::time::{Duration, Instant};

use advize_core::{AppConfig, PostRecord, ProfileRecord, ScrapeMode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::ApifyClient;
use crate::error::ScrapeError;
use crate::handle::profile_url;
use crate::inflight::InFlight;
use crate::normalize::{normalize_post, normalize_profile};
use crate::types::{InstagramScraperInput, RawPostItem, RawProfileItem, ResultsType};

/// Upper bound on the best-effort abort sent after the deadline expires.
const ABORT_GRACE: Duration = Duration::from_secs(5);

/// A successfully normalized scrape result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScrapedRecord {
    Profile(ProfileRecord),
    Post(PostRecord),
}

/// Why a scrape produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Unauthorized,
    RunFailed,
    TimedOut,
    Upstream,
    Unexpected,
}

/// Cloneable summary of a [`ScrapeError`], shared between coalesced callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ScrapeFailure {
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        self.kind == FailureKind::Unexpected
    }
}

impl From<&ScrapeError> for ScrapeFailure {
    fn from(err: &ScrapeError) -> Self {
        let kind = match err {
            ScrapeError::EmptyDataset { .. } | ScrapeError::ItemError { .. } => FailureKind::NotFound,
            ScrapeError::Unauthorized { .. } => FailureKind::Unauthorized,
            ScrapeError::RunFailed { .. } => FailureKind::RunFailed,
            ScrapeError::TimedOut { .. } => FailureKind::TimedOut,
            ScrapeError::Api { .. } => FailureKind::Upstream,
            ScrapeError::Http(_)
            | ScrapeError::Deserialize { .. }
            | ScrapeError::InvalidBaseUrl { .. } => FailureKind::Unexpected,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Outcome of one scrape request: exactly one record or one failure.
pub type ScrapeOutcome = Result<ScrapedRecord, ScrapeFailure>;

/// Runs Instagram profile and post scrapes through a single Apify actor.
pub struct InstagramScraper {
    apify: ApifyClient,
    actor_id: String,
    deadline: Duration,
    inflight: InFlight<(ScrapeMode, String), ScrapeOutcome>,
}

impl InstagramScraper {
    #[must_use]
    pub fn new(apify: ApifyClient, actor_id: &str, deadline: Duration) -> Self {
        Self {
            apify,
            // Apify addresses actors as `user~name` in URLs.
            actor_id: actor_id.replace('/', "~"),
            deadline,
            inflight: InFlight::new(),
        }
    }

    /// Builds a scraper from application config.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the Apify client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScrapeError> {
        let apify = ApifyClient::with_base_url(
            &config.apify_api_token,
            config.http_timeout_secs,
            &config.apify_base_url,
        )?
        .with_run_wait_secs(config.run_wait_secs);

        Ok(Self::new(
            apify,
            &config.instagram_actor,
            Duration::from_secs(config.scrape_timeout_secs),
        ))
    }

    /// Scrapes a normalized target, coalescing with any identical scrape
    /// already in flight.
    ///
    /// `target` must already be normalized: a canonical handle for
    /// [`ScrapeMode::Profile`], a canonical post URL for [`ScrapeMode::Post`].
    pub async fn scrape(&self, mode: ScrapeMode, target: &str) -> ScrapeOutcome {
        let key = (mode, target.to_owned());
        self.inflight
            .run(key, move || async move {
                let result = match mode {
                    ScrapeMode::Profile => self.scrape_profile(target).await.map(ScrapedRecord::Profile),
                    ScrapeMode::Post => self.scrape_post(target).await.map(ScrapedRecord::Post),
                };
                result.map_err(|e| {
                    if e.is_unexpected() {
                        tracing::error!(%mode, scrape_target = target, error = %e, "scrape failed unexpectedly");
                    } else {
                        tracing::warn!(%mode, scrape_target = target, error = %e, "scrape failed");
                    }
                    ScrapeFailure::from(&e)
                })
            })
            .await
    }

    /// Scrapes one profile by canonical handle.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::EmptyDataset`] if the run returned no items.
    /// - [`ScrapeError::ItemError`] if the actor reported the profile as unavailable.
    /// - Any orchestration error from [`Self::run_single`].
    pub async fn scrape_profile(&self, handle: &str) -> Result<ProfileRecord, ScrapeError> {
        tracing::info!(handle, "starting Instagram profile scrape");
        let input = InstagramScraperInput::single(profile_url(handle), ResultsType::Details);
        let item: RawProfileItem =
            self.run_single(&input)
                .await?
                .ok_or_else(|| ScrapeError::EmptyDataset {
                    target: handle.to_owned(),
                })?;
        let record = normalize_profile(item, handle)?;
        tracing::info!(
            handle = %record.handle,
            followers = record.followers_count,
            "Instagram profile scraped"
        );
        Ok(record)
    }

    /// Scrapes one post by canonical post URL.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::EmptyDataset`] if the run returned no items.
    /// - [`ScrapeError::ItemError`] if the actor reported the post as unavailable.
    /// - Any orchestration error from [`Self::run_single`].
    pub async fn scrape_post(&self, post_url: &str) -> Result<PostRecord, ScrapeError> {
        tracing::info!(post_url, "starting Instagram post scrape");
        let input = InstagramScraperInput::single(post_url, ResultsType::Posts);
        let item: RawPostItem =
            self.run_single(&input)
                .await?
                .ok_or_else(|| ScrapeError::EmptyDataset {
                    target: post_url.to_owned(),
                })?;
        let record = normalize_post(item, post_url)?;
        tracing::info!(post_id = %record.id, "Instagram post scraped");
        Ok(record)
    }

    /// Runs the actor for `url` and returns the dataset items untouched.
    ///
    /// Used to inspect which shape the actor returns for a results type.
    ///
    /// # Errors
    ///
    /// Any orchestration error from [`Self::run_single`].
    pub async fn fetch_raw(
        &self,
        url: &str,
        results_type: ResultsType,
    ) -> Result<Vec<serde_json::Value>, ScrapeError> {
        let input = InstagramScraperInput::single(url, results_type);
        self.run_dataset(&input).await
    }

    /// Runs the actor once and returns the first dataset item, if any.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::TimedOut`] if the overall deadline elapses.
    /// - [`ScrapeError::RunFailed`] if the run does not succeed.
    /// - [`ScrapeError::Unauthorized`], [`ScrapeError::Api`],
    ///   [`ScrapeError::Http`], [`ScrapeError::Deserialize`] from the API calls.
    async fn run_single<T: DeserializeOwned>(
        &self,
        input: &InstagramScraperInput,
    ) -> Result<Option<T>, ScrapeError> {
        let mut items: Vec<T> = self.run_dataset(input).await?;
        if items.len() > 1 {
            tracing::debug!(count = items.len(), "dataset had extra items; using the first");
        }
        Ok(if items.is_empty() {
            None
        } else {
            Some(items.swap_remove(0))
        })
    }

    async fn run_dataset<T: DeserializeOwned>(
        &self,
        input: &InstagramScraperInput,
    ) -> Result<Vec<T>, ScrapeError> {
        let started = Instant::now();
        let timed_out = || ScrapeError::TimedOut {
            secs: self.deadline.as_secs(),
        };

        let run = tokio::time::timeout(self.deadline, self.apify.start_run(&self.actor_id, input))
            .await
            .map_err(|_| timed_out())??;
        tracing::info!(run_id = %run.id, "Apify run started, waiting for completion");

        let remaining = self.deadline.saturating_sub(started.elapsed());
        let finished = tokio::time::timeout(remaining, async {
            let completed = self.apify.wait_for_run(&run.id).await?;
            tracing::info!(
                run_id = %completed.id,
                dataset_id = %completed.default_dataset_id,
                "run completed, fetching results"
            );
            self.apify
                .list_dataset_items::<T>(&completed.default_dataset_id)
                .await
        })
        .await;

        match finished {
            Ok(items) => items,
            Err(_) => {
                tracing::warn!(run_id = %run.id, "scrape deadline exceeded, aborting run");
                let grace = ABORT_GRACE.min(self.deadline);
                match tokio::time::timeout(grace, self.apify.abort_run(&run.id)).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(run_id = %run.id, error = %e, "failed to abort run");
                    }
                    Err(_) => {
                        tracing::warn!(run_id = %run.id, "abort request did not finish in time");
                    }
                }
                Err(timed_out())
            }
        }
    }
}
