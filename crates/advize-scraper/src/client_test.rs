use super::*;

fn client(base_url: &str) -> ApifyClient {
    ApifyClient::with_base_url("test-token", 5, base_url).expect("client should build")
}

#[test]
fn endpoint_appends_segments_to_versioned_base() {
    let url = client("https://api.apify.com/v2").endpoint(&["acts", "apify~instagram-scraper", "runs"]);
    assert_eq!(
        url.as_str(),
        "https://api.apify.com/v2/acts/apify~instagram-scraper/runs"
    );
}

#[test]
fn endpoint_tolerates_trailing_slash_and_bare_host() {
    let url = client("https://api.apify.com/v2/").endpoint(&["actor-runs", "run1"]);
    assert_eq!(url.as_str(), "https://api.apify.com/v2/actor-runs/run1");

    let url = client("http://127.0.0.1:8080").endpoint(&["datasets", "ds1", "items"]);
    assert_eq!(url.as_str(), "http://127.0.0.1:8080/datasets/ds1/items");
}

#[test]
fn endpoint_encodes_path_separators_in_segments() {
    let url = client("https://api.apify.com/v2").endpoint(&["acts", "apify/instagram-scraper", "runs"]);
    assert_eq!(
        url.as_str(),
        "https://api.apify.com/v2/acts/apify%2Finstagram-scraper/runs"
    );
}

#[test]
fn with_base_url_rejects_invalid_url() {
    let result = ApifyClient::with_base_url("test-token", 5, "not a url");
    assert!(matches!(result, Err(ScrapeError::InvalidBaseUrl { .. })));
}

#[test]
fn truncate_keeps_short_bodies() {
    assert_eq!(truncate("short", 10), "short");
}

#[test]
fn truncate_cuts_on_char_boundary() {
    assert_eq!(truncate("ééééé", 2), "éé…");
}
