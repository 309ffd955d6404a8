use advize_scraper::{ImageProxyError, ProxiedImage};
use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{error_response, AppState};

const CACHE_CONTROL_VALUE: &str = "public, max-age=86400, stale-while-revalidate=3600";

#[derive(Debug, Deserialize)]
pub(super) struct ImageProxyQuery {
    url: Option<String>,
}

pub(super) async fn proxy_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ImageProxyQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            tracing::debug!(request_id = %req_id.0, error = %rejection, "unreadable image proxy query");
            return error_response(StatusCode::BAD_REQUEST, "Invalid query string");
        }
    };

    match state.image_proxy.fetch(query.url.as_deref()).await {
        Ok(image) => image_response(image),
        Err(err) => proxy_error_response(&req_id, &err),
    }
}

fn image_response(image: ProxiedImage) -> Response {
    let content_type = HeaderValue::from_str(&image.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("image/jpeg"));
    let content_length = image.content_length;
    let body = Body::from_stream(image.into_upstream().bytes_stream());

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static(CACHE_CONTROL_VALUE),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ),
        ],
        body,
    )
        .into_response();
    if let Some(len) = content_length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    response
}

fn proxy_error_response(req_id: &RequestId, err: &ImageProxyError) -> Response {
    match err {
        ImageProxyError::MissingUrl | ImageProxyError::InvalidUrl { .. } => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        ImageProxyError::HostNotAllowed { host } => {
            tracing::warn!(request_id = %req_id.0, host, "image proxy refused host");
            error_response(StatusCode::FORBIDDEN, "Domain not allowed")
        }
        ImageProxyError::UpstreamStatus { status } => {
            tracing::debug!(request_id = %req_id.0, status, "image upstream returned non-OK");
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
            error_response(status, "Failed to fetch image")
        }
        ImageProxyError::Http(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "image proxy fetch failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
