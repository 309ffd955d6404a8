use advize_core::{ScrapeMode, ScrapeRequest};
use advize_scraper::{extract_handle, normalize_post_url};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::middleware::RequestId;

use super::{AppState, ScrapeResponse};

const GENERIC_FAILURE: &str = "Internal server error";

pub(super) async fn scrape_from_body(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(request)) => run_scrape(&state, &req_id, &request).await,
        Err(rejection) => {
            tracing::debug!(request_id = %req_id.0, error = %rejection, "unreadable scrape body");
            bad_request("Request body must be JSON of the form {\"url\": \"...\"}")
        }
    }
}

pub(super) async fn scrape_from_query(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ScrapeRequest>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(request)) => run_scrape(&state, &req_id, &request).await,
        Err(rejection) => {
            tracing::debug!(request_id = %req_id.0, error = %rejection, "unreadable scrape query");
            bad_request("Invalid query string")
        }
    }
}

async fn run_scrape(state: &AppState, req_id: &RequestId, request: &ScrapeRequest) -> Response {
    let (mode, target) = match resolve_target(request) {
        Ok(resolved) => resolved,
        Err(message) => return bad_request(message),
    };

    tracing::info!(request_id = %req_id.0, %mode, scrape_target = %target, "instagram scrape requested");

    match state.scraper.scrape(mode, &target).await {
        Ok(record) => (StatusCode::OK, Json(ScrapeResponse::ok(record))).into_response(),
        Err(failure) if failure.is_unexpected() => {
            tracing::error!(
                request_id = %req_id.0,
                error = %failure.message,
                "instagram scrape failed unexpectedly"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ScrapeResponse::failed(GENERIC_FAILURE)),
            )
                .into_response()
        }
        Err(failure) => {
            (StatusCode::OK, Json(ScrapeResponse::failed(failure.message))).into_response()
        }
    }
}

/// Turns a raw request into a scrape mode and canonical target.
fn resolve_target(request: &ScrapeRequest) -> Result<(ScrapeMode, String), String> {
    let mode = request.mode()?;
    let input = request
        .target()
        .ok_or_else(|| "Missing required field: url".to_owned())?;

    let target = match mode {
        ScrapeMode::Profile => extract_handle(input)
            .ok_or_else(|| format!("Could not extract an Instagram username from '{input}'"))?,
        ScrapeMode::Post => normalize_post_url(input)
            .ok_or_else(|| format!("Not a valid Instagram post URL: '{input}'"))?,
    };
    Ok((mode, target))
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ScrapeResponse::failed(message)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: Option<&str>, mode: Option<&str>) -> ScrapeRequest {
        ScrapeRequest {
            url: url.map(ToOwned::to_owned),
            mode: mode.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn resolve_target_defaults_to_profile() {
        let (mode, target) =
            resolve_target(&request(Some("https://instagram.com/NatGeo/"), None)).unwrap();
        assert_eq!(mode, ScrapeMode::Profile);
        assert_eq!(target, "natgeo");
    }

    #[test]
    fn resolve_target_normalizes_post_urls() {
        let (mode, target) = resolve_target(&request(
            Some("instagram.com/reels/C1a2B3c4D5e/?igsh=abc"),
            Some("post"),
        ))
        .unwrap();
        assert_eq!(mode, ScrapeMode::Post);
        assert_eq!(target, "https://www.instagram.com/reel/C1a2B3c4D5e/");
    }

    #[test]
    fn resolve_target_rejects_missing_url() {
        let err = resolve_target(&request(Some("   "), None)).unwrap_err();
        assert!(err.contains("url"), "{err}");
    }

    #[test]
    fn resolve_target_rejects_unknown_type() {
        assert!(resolve_target(&request(Some("natgeo"), Some("story"))).is_err());
    }

    #[test]
    fn resolve_target_rejects_post_url_in_profile_mode() {
        assert!(resolve_target(&request(Some("https://instagram.com/p/C1a2B3c4D5e/"), None)).is_err());
    }
}
