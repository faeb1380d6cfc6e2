//! Static asset serving

use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};

/// Serve a file from the configured static directory.
pub async fn serve_static(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> impl IntoResponse {
    // Reject path traversal attempts before touching the filesystem.
    if path.contains("..") || path.contains("//") || path.contains('\\') || path.starts_with('/') {
        return status_response(StatusCode::BAD_REQUEST);
    }

    let file_path = state.config.static_dir.join(&path);
    match tokio::fs::read(&file_path).await {
        Ok(contents) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type_for(&path))
            .body(Body::from(contents))
            .unwrap_or_else(|_| status_response(StatusCode::INTERNAL_SERVER_ERROR)),
        Err(_) => status_response(StatusCode::NOT_FOUND),
    }
}

fn status_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
