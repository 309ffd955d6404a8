//! Normalized Instagram records returned to platform clients.
//!
//! These are the shapes the web UI consumes, so they serialize in camelCase.
//! Nothing here is persisted by the scrape pipeline; callers decide what to
//! store.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which kind of Instagram entity a scrape targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMode {
    #[default]
    Profile,
    Post,
}

impl ScrapeMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeMode::Profile => "profile",
            ScrapeMode::Post => "post",
        }
    }
}

impl std::fmt::Display for ScrapeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" => Ok(ScrapeMode::Profile),
            "post" => Ok(ScrapeMode::Post),
            other => Err(format!(
                "unsupported type '{other}'; expected \"profile\" or \"post\""
            )),
        }
    }
}

/// Inbound scrape request as posted by the UI (`{url, type}`).
///
/// Both fields are optional at the wire level so that missing input can be
/// answered with a 400 rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub mode: Option<String>,
}

impl ScrapeRequest {
    /// The requested URL, trimmed, if non-blank.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Resolves the requested mode, defaulting to [`ScrapeMode::Profile`].
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when `type` is present but unknown.
    pub fn mode(&self) -> Result<ScrapeMode, String> {
        match self.mode.as_deref().map(str::trim) {
            None | Some("") => Ok(ScrapeMode::default()),
            Some(raw) => raw.parse(),
        }
    }
}

/// A normalized Instagram profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    /// Canonical lower-case handle, e.g. `"natgeo"`.
    pub handle: String,
    pub full_name: Option<String>,
    pub biography: Option<String>,
    pub followers_count: u64,
    pub follows_count: u64,
    pub posts_count: u64,
    pub external_urls: Vec<String>,
    /// Highest-resolution avatar the upstream returned.
    pub profile_pic_url: Option<String>,
    pub profile_url: String,
    pub verified: bool,
    pub is_business_account: bool,
    pub is_private: bool,
}

/// A normalized Instagram post, reel or carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: String,
    pub short_code: Option<String>,
    pub owner_handle: Option<String>,
    pub owner_full_name: Option<String>,
    pub caption: Option<String>,
    /// Upstream media type, e.g. `"Image"`, `"Video"`, `"Sidecar"`.
    pub post_type: Option<String>,
    pub url: Option<String>,
    pub display_url: Option<String>,
    /// Every distinct media asset: display image, carousel children, video.
    pub media_urls: Vec<String>,
    pub likes_count: Option<u64>,
    pub comments_count: Option<u64>,
    pub video_view_count: Option<u64>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
}
