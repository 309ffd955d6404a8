//! End-to-end tests for `InstagramScraper` against a wiremock Apify API.
//!
//! Each test mounts the three calls of one actor run (start, wait, dataset)
//! and checks the normalized outcome.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use advize_core::ScrapeMode;
use advize_scraper::{ApifyClient, FailureKind, InstagramScraper, ScrapedRecord};

const ACTOR: &str = "apify/instagram-scraper";
const RUNS_PATH: &str = "/acts/apify~instagram-scraper/runs";

fn scraper(server: &MockServer, deadline: Duration) -> InstagramScraper {
    let apify = ApifyClient::with_base_url("test-token", 5, &server.uri())
        .expect("failed to build test ApifyClient")
        .with_run_wait_secs(1);
    InstagramScraper::new(apify, ACTOR, deadline)
}

fn run_json(status: &str) -> serde_json::Value {
    json!({
        "data": {
            "id": "run-1",
            "status": status,
            "defaultDatasetId": "ds-1"
        }
    })
}

async fn mount_successful_run(server: &MockServer, items: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json("READY")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("SUCCEEDED")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn profile_scrape_sends_details_request_and_normalizes_item() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .and(body_partial_json(json!({
            "directUrls": ["https://www.instagram.com/natgeo/"],
            "resultsType": "details",
            "resultsLimit": 1
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json("READY")))
        .expect(1)
        .mount(&server)
        .await;
    mount_successful_run(
        &server,
        json!([{
            "username": "NatGeo",
            "fullName": "National Geographic",
            "biography": "Experience the world",
            "followersCount": 500,
            "followsCount": 12,
            "postsCount": 30000,
            "verified": true,
            "externalUrls": [{ "url": "https://natgeo.com", "title": "site" }]
        }]),
    )
    .await;

    let outcome = scraper(&server, Duration::from_secs(5))
        .scrape(ScrapeMode::Profile, "natgeo")
        .await;

    let profile = match outcome {
        Ok(ScrapedRecord::Profile(profile)) => profile,
        other => panic!("expected profile record, got {other:?}"),
    };
    assert_eq!(profile.handle, "natgeo");
    assert_eq!(profile.full_name.as_deref(), Some("National Geographic"));
    assert_eq!(profile.followers_count, 500);
    assert_eq!(profile.follows_count, 12);
    assert_eq!(profile.posts_count, 30000);
    assert!(profile.verified);
    assert_eq!(profile.external_urls, vec!["https://natgeo.com".to_owned()]);
    assert_eq!(profile.profile_url, "https://www.instagram.com/natgeo/");
}

#[tokio::test]
async fn profile_scrape_reads_counts_nested_under_owner() {
    let server = MockServer::start().await;
    mount_successful_run(
        &server,
        json!([{
            "ownerUsername": "natgeo",
            "owner": { "followersCount": 500, "postsCount": 7 }
        }]),
    )
    .await;

    let outcome = scraper(&server, Duration::from_secs(5))
        .scrape(ScrapeMode::Profile, "natgeo")
        .await;

    let profile = match outcome {
        Ok(ScrapedRecord::Profile(profile)) => profile,
        other => panic!("expected profile record, got {other:?}"),
    };
    assert_eq!(profile.followers_count, 500);
    assert_eq!(profile.posts_count, 7);
    assert_eq!(profile.follows_count, 0);
}

#[tokio::test]
async fn empty_dataset_is_reported_as_not_found() {
    let server = MockServer::start().await;
    mount_successful_run(&server, json!([])).await;

    let failure = scraper(&server, Duration::from_secs(5))
        .scrape(ScrapeMode::Profile, "nobody_here")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::NotFound);
    assert!(failure.message.contains("nobody_here"), "{}", failure.message);
    assert!(!failure.is_unexpected());
}

#[tokio::test]
async fn actor_error_item_is_reported_as_not_found() {
    let server = MockServer::start().await;
    mount_successful_run(
        &server,
        json!([{ "error": "not_found", "errorDescription": "Profile does not exist" }]),
    )
    .await;

    let failure = scraper(&server, Duration::from_secs(5))
        .scrape(ScrapeMode::Profile, "ghost")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::NotFound);
    assert!(failure.message.contains("Profile does not exist"), "{}", failure.message);
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_scrape_sends_posts_request_and_normalizes_item() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .and(body_partial_json(json!({
            "directUrls": ["https://www.instagram.com/p/C1a2B3c4D5e/"],
            "resultsType": "posts"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json("READY")))
        .expect(1)
        .mount(&server)
        .await;
    mount_successful_run(
        &server,
        json!([{
            "id": "3301",
            "shortCode": "C1a2B3c4D5e",
            "type": "Image",
            "caption": "Sunset #travel @friend",
            "displayUrl": "https://scontent.cdninstagram.com/a.jpg",
            "likesCount": 1200,
            "commentsCount": 34,
            "ownerUsername": "natgeo",
            "hashtags": ["travel"],
            "mentions": ["friend"],
            "timestamp": "2024-05-01T12:00:00.000Z"
        }]),
    )
    .await;

    let outcome = scraper(&server, Duration::from_secs(5))
        .scrape(ScrapeMode::Post, "https://www.instagram.com/p/C1a2B3c4D5e/")
        .await;

    let post = match outcome {
        Ok(ScrapedRecord::Post(post)) => post,
        other => panic!("expected post record, got {other:?}"),
    };
    assert_eq!(post.id, "3301");
    assert_eq!(post.owner_handle.as_deref(), Some("natgeo"));
    assert_eq!(post.likes_count, Some(1200));
    assert_eq!(post.comments_count, Some(34));
    assert_eq!(post.media_urls, vec!["https://scontent.cdninstagram.com/a.jpg".to_owned()]);
    assert_eq!(post.hashtags, vec!["travel".to_owned()]);
    assert!(post.timestamp.is_some());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_token_is_reported_as_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let failure = scraper(&server, Duration::from_secs(5))
        .scrape(ScrapeMode::Profile, "natgeo")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Unauthorized);
}

#[tokio::test]
async fn failed_run_is_reported_and_dataset_is_not_fetched() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json("READY")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("FAILED")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let failure = scraper(&server, Duration::from_secs(5))
        .scrape(ScrapeMode::Profile, "natgeo")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::RunFailed);
    assert!(failure.message.contains("FAILED"), "{}", failure.message);
}

#[tokio::test]
async fn deadline_aborts_the_run_and_reports_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json("READY")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(run_json("RUNNING"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/actor-runs/run-1/abort"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_json("ABORTING")))
        .expect(1)
        .mount(&server)
        .await;

    let failure = scraper(&server, Duration::from_millis(300))
        .scrape(ScrapeMode::Profile, "natgeo")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::TimedOut);
}

#[tokio::test]
async fn slow_abort_does_not_stretch_the_deadline() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json("READY")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(run_json("RUNNING"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/actor-runs/run-1/abort"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(run_json("ABORTING"))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let failure = scraper(&server, Duration::from_millis(300))
        .scrape(ScrapeMode::Profile, "natgeo")
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(failure.kind, FailureKind::TimedOut);
    assert!(
        elapsed < Duration::from_secs(2),
        "timeout should be reported shortly after the deadline, took {elapsed:?}"
    );
}

// ---------------------------------------------------------------------------
// Coalescing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identical_concurrent_scrapes_share_one_actor_run() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(run_json("READY")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(run_json("SUCCEEDED"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/ds-1/items"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "username": "natgeo", "followersCount": 500 }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper(&server, Duration::from_secs(5));
    let (a, b) = tokio::join!(
        scraper.scrape(ScrapeMode::Profile, "natgeo"),
        scraper.scrape(ScrapeMode::Profile, "natgeo"),
    );

    assert_eq!(a, b);
    assert!(matches!(a, Ok(ScrapedRecord::Profile(ref p)) if p.followers_count == 500));
}
