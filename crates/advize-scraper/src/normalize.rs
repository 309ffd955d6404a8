//! Normalization from raw Apify dataset items to
//! [`advize_core::ProfileRecord`] and [`advize_core::PostRecord`].
//!
//! The actor places profile counts either at the top level of an item or
//! under a nested `owner` object, depending on `resultsType`. Each count is
//! resolved through [`CountSource`]: top level first, then `owner`, then
//! absent (reported as zero).

use advize_core::{PostRecord, ProfileRecord};
use chrono::{DateTime, Utc};

use crate::error::ScrapeError;
use crate::handle::profile_url;
use crate::types::{RawPostItem, RawProfileFields, RawProfileItem};

/// Where a profile count was found in an upstream item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
    TopLevel(u64),
    Owner(u64),
    Absent,
}

impl CountSource {
    /// Resolves a count from its two possible locations, preferring the
    /// top-level value.
    #[must_use]
    pub fn resolve(top: Option<u64>, owner: Option<u64>) -> Self {
        match (top, owner) {
            (Some(n), _) => CountSource::TopLevel(n),
            (None, Some(n)) => CountSource::Owner(n),
            (None, None) => CountSource::Absent,
        }
    }

    #[must_use]
    pub fn value(self) -> u64 {
        match self {
            CountSource::TopLevel(n) | CountSource::Owner(n) => n,
            CountSource::Absent => 0,
        }
    }
}

/// Normalizes a `details` dataset item into a [`ProfileRecord`].
///
/// `requested_handle` is used when the item carries no username of its own.
/// Missing counts become zero; this never fails on shape alone.
///
/// # Errors
///
/// Returns [`ScrapeError::ItemError`] if the actor reported a failure in
/// place of the profile (e.g. `{"error": "not_found"}`).
pub fn normalize_profile(
    item: RawProfileItem,
    requested_handle: &str,
) -> Result<ProfileRecord, ScrapeError> {
    if let Some(message) = item_error(item.error.as_deref(), item.error_description.as_deref()) {
        return Err(ScrapeError::ItemError {
            target: requested_handle.to_owned(),
            message,
        });
    }

    let RawProfileItem {
        top,
        owner,
        owner_username,
        owner_full_name,
        ..
    } = item;
    let owner = owner.unwrap_or_default();

    let followers = CountSource::resolve(top.followers_count, owner.followers_count);
    let follows = CountSource::resolve(top.follows_count, owner.follows_count);
    let posts = CountSource::resolve(top.posts_count, owner.posts_count);
    tracing::debug!(
        handle = requested_handle,
        ?followers,
        ?follows,
        ?posts,
        "resolved profile counts"
    );

    let handle = non_empty(top.username.clone())
        .or_else(|| non_empty(owner.username.clone()))
        .or_else(|| non_empty(owner_username))
        .map_or_else(|| requested_handle.to_owned(), |h| h.to_ascii_lowercase());

    let full_name = non_empty(top.full_name.clone())
        .or_else(|| non_empty(owner.full_name.clone()))
        .or_else(|| non_empty(owner_full_name));

    let biography = non_empty(top.biography.clone()).or_else(|| non_empty(owner.biography.clone()));

    let profile_pic_url = non_empty(top.profile_pic_url_hd.clone())
        .or_else(|| non_empty(top.profile_pic_url.clone()))
        .or_else(|| non_empty(owner.profile_pic_url_hd.clone()))
        .or_else(|| non_empty(owner.profile_pic_url.clone()));

    let mut external_urls = collect_external_urls(&top);
    if external_urls.is_empty() {
        external_urls = collect_external_urls(&owner);
    }

    Ok(ProfileRecord {
        profile_url: profile_url(&handle),
        handle,
        full_name,
        biography,
        followers_count: followers.value(),
        follows_count: follows.value(),
        posts_count: posts.value(),
        external_urls,
        profile_pic_url,
        verified: top.verified.or(owner.verified).unwrap_or(false),
        is_business_account: top
            .is_business_account
            .or(owner.is_business_account)
            .unwrap_or(false),
        is_private: top.private.or(owner.private).unwrap_or(false),
    })
}

/// Normalizes a `posts` dataset item into a [`PostRecord`].
///
/// # Errors
///
/// - [`ScrapeError::ItemError`] if the actor reported a failure in place of
///   the post.
/// - [`ScrapeError::EmptyDataset`] if the item has neither an id nor a
///   short code to identify it.
pub fn normalize_post(item: RawPostItem, requested_url: &str) -> Result<PostRecord, ScrapeError> {
    if let Some(message) = item_error(item.error.as_deref(), item.error_description.as_deref()) {
        return Err(ScrapeError::ItemError {
            target: requested_url.to_owned(),
            message,
        });
    }

    let short_code = non_empty(item.short_code);
    let Some(id) = non_empty(item.id).or_else(|| short_code.clone()) else {
        return Err(ScrapeError::EmptyDataset {
            target: requested_url.to_owned(),
        });
    };

    let owner = item.owner.unwrap_or_default();
    let owner_handle = non_empty(item.owner_username)
        .or_else(|| non_empty(owner.username))
        .map(|h| h.to_ascii_lowercase());
    let owner_full_name = non_empty(item.owner_full_name).or_else(|| non_empty(owner.full_name));

    let display_url = non_empty(item.display_url);
    let media_urls = collect_media_urls(
        display_url.as_deref(),
        &item.images,
        &item.child_posts,
        item.video_url.as_deref(),
    );

    let url = non_empty(item.url).or_else(|| {
        short_code
            .as_ref()
            .map(|code| format!("https://www.instagram.com/p/{code}/"))
    });

    Ok(PostRecord {
        id,
        short_code,
        owner_handle,
        owner_full_name,
        caption: non_empty(item.caption),
        post_type: non_empty(item.post_type),
        url,
        display_url,
        media_urls,
        likes_count: item.likes_count,
        comments_count: item.comments_count,
        video_view_count: item.video_view_count.or(item.video_play_count),
        hashtags: item.hashtags,
        mentions: item.mentions,
        timestamp: item.timestamp.as_deref().and_then(parse_timestamp),
    })
}

fn item_error(error: Option<&str>, description: Option<&str>) -> Option<String> {
    let error = error.map(str::trim).filter(|e| !e.is_empty())?;
    Some(match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => format!("{error}: {description}"),
        None => error.to_owned(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn collect_external_urls(fields: &RawProfileFields) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let candidates = fields
        .external_urls
        .iter()
        .filter_map(|u| u.url())
        .chain(fields.external_url.as_deref());
    for url in candidates {
        let url = url.trim();
        if !url.is_empty() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_owned());
        }
    }
    urls
}

fn collect_media_urls(
    display_url: Option<&str>,
    images: &[String],
    child_posts: &[crate::types::RawChildPost],
    video_url: Option<&str>,
) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let candidates = display_url
        .into_iter()
        .chain(images.iter().map(String::as_str))
        .chain(child_posts.iter().filter_map(|c| c.display_url.as_deref()))
        .chain(child_posts.iter().filter_map(|c| c.video_url.as_deref()))
        .chain(video_url);
    for url in candidates {
        if !url.is_empty() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_owned());
        }
    }
    urls
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
