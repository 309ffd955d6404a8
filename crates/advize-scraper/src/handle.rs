//! Extraction of canonical Instagram handles and post URLs from user input.
//!
//! Inputs arrive straight from form fields, so they can be a bare handle
//! (`natgeo`, `@natgeo`), a profile URL in any of its common spellings, or a
//! post URL. Anything that does not resolve yields `None` so the caller can
//! answer with a 400.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._]{1,30}$").expect("valid handle regex"));
static SHORT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{5,64}$").expect("valid short code regex"));

const INSTAGRAM_HOSTS: &[&str] = &[
    "instagram.com",
    "www.instagram.com",
    "m.instagram.com",
    "instagr.am",
    "www.instagr.am",
];

/// First path segments that are Instagram routes rather than handles.
const RESERVED_SEGMENTS: &[&str] = &[
    "p",
    "reel",
    "reels",
    "tv",
    "explore",
    "accounts",
    "direct",
    "about",
    "legal",
    "developer",
    "web",
    "api",
    "challenge",
];

/// Path segments that introduce a post short code.
const POST_KINDS: &[&str] = &["p", "reel", "reels", "tv"];

/// Extracts the canonical (lower-case) handle from a bare handle or an
/// Instagram profile/post URL.
///
/// Returns `None` for empty input, non-Instagram hosts, post URLs that do
/// not name their owner, and anything outside the handle alphabet.
#[must_use]
pub fn extract_handle(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if !looks_like_url(input) {
        return canonical_handle(input.strip_prefix('@').unwrap_or(input));
    }

    let segments = instagram_path_segments(input)?;
    let first = segments.first()?;

    if first.eq_ignore_ascii_case("stories") {
        return segments.get(1).and_then(|s| canonical_handle(s));
    }
    if RESERVED_SEGMENTS.contains(&first.to_ascii_lowercase().as_str()) {
        return None;
    }

    canonical_handle(first.strip_prefix('@').unwrap_or(first))
}

/// Normalizes an Instagram post, reel or IGTV URL to
/// `https://www.instagram.com/<kind>/<code>/`.
///
/// Accepts the owner-prefixed form (`instagram.com/<handle>/p/<code>/`) and
/// drops query strings and fragments. Returns `None` for anything else.
#[must_use]
pub fn normalize_post_url(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() || !looks_like_url(input) {
        return None;
    }

    let segments = instagram_path_segments(input)?;
    let kind_idx = segments
        .iter()
        .take(2)
        .position(|s| POST_KINDS.contains(&s.to_ascii_lowercase().as_str()))?;
    let kind = segments[kind_idx].to_ascii_lowercase();
    let code = segments.get(kind_idx + 1)?;

    if !SHORT_CODE_RE.is_match(code) {
        return None;
    }

    // `/reels/<code>/` is an alias for `/reel/<code>/`.
    let kind = if kind == "reels" { "reel".to_string() } else { kind };
    Some(format!("https://www.instagram.com/{kind}/{code}/"))
}

/// Canonical profile URL for a handle, as sent to the scraping actor.
#[must_use]
pub fn profile_url(handle: &str) -> String {
    format!("https://www.instagram.com/{handle}/")
}

fn looks_like_url(input: &str) -> bool {
    input.contains("://") || input.contains('/')
}

fn canonical_handle(candidate: &str) -> Option<String> {
    let lowered = candidate.trim().to_ascii_lowercase();
    HANDLE_RE.is_match(&lowered).then_some(lowered)
}

/// Parses `input` as a URL (adding `https://` when the scheme is missing)
/// and returns its non-empty path segments when the host is Instagram.
fn instagram_path_segments(input: &str) -> Option<Vec<String>> {
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input.trim_start_matches('/'))
    };

    let url = Url::parse(&with_scheme).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if !INSTAGRAM_HOSTS.contains(&host.as_str()) {
        return None;
    }

    let segments: Vec<String> = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    (!segments.is_empty()).then_some(segments)
}

#[cfg(test)]
#[path = "handle_test.rs"]
mod tests;
