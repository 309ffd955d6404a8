//! Apify REST API types and raw `apify/instagram-scraper` dataset items.
//!
//! ## Observed item shapes
//!
//! The same actor produces different item layouts depending on
//! `resultsType`:
//!
//! - `details` returns one profile object with `username`, `fullName`,
//!   `followersCount`, `followsCount`, `postsCount`, `biography`,
//!   `externalUrls`, `profilePicUrl`/`profilePicUrlHD` at the top level.
//! - `posts` returns post objects whose author data is flattened into
//!   `ownerUsername`/`ownerFullName`, and on some actor builds nested under
//!   an `owner` object that may carry its own counts.
//!
//! Failed lookups come back as a single item `{"error": "...",
//! "errorDescription": "..."}` instead of an empty dataset.
//!
//! Counts are usually integers but have been seen as floats, numeric
//! strings, `null`, and `-1` (hidden likes). Everything is modelled as
//! optional and parsed leniently; [`crate::normalize`] decides defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "ABORTING")]
    Aborting,
    #[serde(rename = "ABORTED")]
    Aborted,
    #[serde(rename = "TIMING-OUT")]
    TimingOut,
    #[serde(rename = "TIMED-OUT")]
    TimedOut,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// `true` once the run can no longer change state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Aborted | RunStatus::TimedOut
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Ready => "READY",
            RunStatus::Running => "RUNNING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::Failed => "FAILED",
            RunStatus::Aborting => "ABORTING",
            RunStatus::Aborted => "ABORTED",
            RunStatus::TimingOut => "TIMING-OUT",
            RunStatus::TimedOut => "TIMED-OUT",
            RunStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunData {
    pub id: String,
    pub status: RunStatus,
    pub default_dataset_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// `resultsType` values understood by the Instagram actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultsType {
    Details,
    Posts,
}

impl std::str::FromStr for ResultsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "details" => Ok(ResultsType::Details),
            "posts" => Ok(ResultsType::Posts),
            other => Err(format!("unknown results type '{other}'")),
        }
    }
}

/// Input for the `apify/instagram-scraper` actor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramScraperInput {
    pub direct_urls: Vec<String>,
    pub results_type: ResultsType,
    pub results_limit: u32,
}

impl InstagramScraperInput {
    /// Single-item input for one URL.
    #[must_use]
    pub fn single(url: impl Into<String>, results_type: ResultsType) -> Self {
        Self {
            direct_urls: vec![url.into()],
            results_type,
            results_limit: 1,
        }
    }
}

/// Profile fields as they appear either at the top level of a `details`
/// item or inside a nested `owner` object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProfileFields {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub biography: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub followers_count: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub follows_count: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub posts_count: Option<u64>,
    pub profile_pic_url: Option<String>,
    #[serde(rename = "profilePicUrlHD")]
    pub profile_pic_url_hd: Option<String>,
    pub external_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub external_urls: Vec<RawExternalUrl>,
    pub verified: Option<bool>,
    pub is_business_account: Option<bool>,
    pub private: Option<bool>,
}

/// Entry of `externalUrls`; older builds emit plain strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawExternalUrl {
    Link {
        url: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
    Plain(String),
}

impl RawExternalUrl {
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            RawExternalUrl::Link { url, .. } => url.as_deref(),
            RawExternalUrl::Plain(url) => Some(url.as_str()),
        }
    }
}

/// One dataset item from a `resultsType: "details"` run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProfileItem {
    #[serde(flatten)]
    pub top: RawProfileFields,
    pub owner: Option<RawProfileFields>,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Carousel child of a `Sidecar` post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawChildPost {
    pub display_url: Option<String>,
    pub video_url: Option<String>,
}

/// One dataset item from a `resultsType: "posts"` run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPostItem {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    pub short_code: Option<String>,
    pub caption: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub url: Option<String>,
    pub display_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    pub video_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub child_posts: Vec<RawChildPost>,
    #[serde(deserialize_with = "lenient_count")]
    pub likes_count: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub comments_count: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub video_view_count: Option<u64>,
    #[serde(deserialize_with = "lenient_count")]
    pub video_play_count: Option<u64>,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub owner: Option<RawProfileFields>,
    #[serde(deserialize_with = "null_as_default")]
    pub hashtags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub mentions: Vec<String>,
    pub timestamp: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Reads a count that may be an integer, a float, or a numeric string.
/// Negative or non-numeric values are treated as absent.
pub(crate) fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(float_to_count)
        }),
        Value::String(s) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_count(f: f64) -> u64 {
    f.round() as u64
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn count_from_value_accepts_numeric_shapes() {
        assert_eq!(count_from_value(&json!(500)), Some(500));
        assert_eq!(count_from_value(&json!(500.0)), Some(500));
        assert_eq!(count_from_value(&json!("1,250")), Some(1250));
        assert_eq!(count_from_value(&json!(-1)), None);
        assert_eq!(count_from_value(&json!(null)), None);
        assert_eq!(count_from_value(&json!("lots")), None);
    }

    #[test]
    fn run_status_parses_hyphenated_values() {
        let run: RunData = serde_json::from_value(json!({
            "id": "run1",
            "status": "TIMED-OUT",
            "defaultDatasetId": "ds1"
        }))
        .unwrap();
        assert_eq!(run.status, RunStatus::TimedOut);
        assert!(run.status.is_terminal());
    }

    #[test]
    fn run_status_tolerates_unknown_values() {
        let run: RunData = serde_json::from_value(json!({
            "id": "run1",
            "status": "PAUSED",
            "defaultDatasetId": "ds1"
        }))
        .unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert!(!run.status.is_terminal());
    }

    #[test]
    fn scraper_input_serializes_actor_field_names() {
        let input = InstagramScraperInput::single("https://www.instagram.com/natgeo/", ResultsType::Details);
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(
            json,
            json!({
                "directUrls": ["https://www.instagram.com/natgeo/"],
                "resultsType": "details",
                "resultsLimit": 1
            })
        );
    }

    #[test]
    fn profile_item_reads_nested_owner_and_nulls() {
        let item: RawProfileItem = serde_json::from_value(json!({
            "username": "natgeo",
            "externalUrls": null,
            "owner": { "followersCount": "500" }
        }))
        .unwrap();
        assert_eq!(item.top.username.as_deref(), Some("natgeo"));
        assert!(item.top.external_urls.is_empty());
        assert_eq!(item.owner.and_then(|o| o.followers_count), Some(500));
    }

    #[test]
    fn post_item_accepts_numeric_id() {
        let item: RawPostItem = serde_json::from_value(json!({
            "id": 3_141_592_653_u64,
            "shortCode": "Cxyz",
            "likesCount": -1
        }))
        .unwrap();
        assert_eq!(item.id.as_deref(), Some("3141592653"));
        assert_eq!(item.likes_count, None);
    }
}
