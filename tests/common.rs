//! Shared helpers for router-level tests: a stub-backed app and multipart
//! request construction.

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use framelens_core::ServiceConfig;
use framelens_server::{create_router, AppState};
use framelens_vision::StubDetector;
use image::{Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

pub const BOUNDARY: &str = "framelens-test-boundary";

/// Router backed by the stub detector (two canned detections per frame).
pub fn test_app() -> Router {
    let state = AppState::new(Arc::new(StubDetector::default()), ServiceConfig::default());
    create_router(state)
}

/// Router whose stub detector returns a fixed number of detections.
pub fn test_app_with_detections(count: usize) -> Router {
    let state = AppState::new(Arc::new(StubDetector::new(count)), ServiceConfig::default());
    create_router(state)
}

/// PNG-encode a uniform gray test frame.
pub fn png_frame(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([100, 100, 100]));
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("png encode");
    png
}

/// Build a multipart/form-data body with a single field.
pub fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"frame.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST request uploading `bytes` as the given multipart field.
pub fn frame_request(field: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process-frame")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, bytes)))
        .expect("build request")
}

/// POST request with a JSON body.
pub fn json_request(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .expect("build request")
}
