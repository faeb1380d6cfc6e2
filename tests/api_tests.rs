//! Router-level tests for the frame processing endpoint.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use framelens_tests::{frame_request, json_request, png_frame, test_app, test_app_with_detections};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

#[tokio::test]
async fn valid_frame_returns_annotated_image_and_count() {
    let app = test_app();
    let response = app
        .oneshot(frame_request("frame", &png_frame(64, 64)))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);

    let detections = response
        .headers()
        .get("X-Detections")
        .expect("X-Detections header")
        .to_str()
        .expect("header value")
        .parse::<usize>()
        .expect("numeric detection count");
    assert_eq!(detections, 2);

    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "no-cache"
    );
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type == "image/webp" || content_type == "image/jpeg");

    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert!(!body.is_empty());
}

#[tokio::test]
async fn zero_detections_is_a_success() {
    let app = test_app_with_detections(0);
    let response = app
        .oneshot(frame_request("frame", &png_frame(64, 64)))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("X-Detections").unwrap(), "0");

    // The body is still the re-encoded input frame, not empty.
    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert!(!body.is_empty());
    let decoded = image::load_from_memory(&body).expect("decode response image");
    assert_eq!(decoded.width(), 64);
    assert_eq!(decoded.height(), 64);
}

#[tokio::test]
async fn response_round_trips_to_input_dimensions() {
    let app = test_app();
    let response = app
        .oneshot(frame_request("frame", &png_frame(80, 60)))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.expect("body").to_bytes();
    let decoded = image::load_from_memory(&body).expect("decode response image");
    assert_eq!(decoded.width(), 80);
    assert_eq!(decoded.height(), 60);
}

#[tokio::test]
async fn corrupt_bytes_return_400_with_empty_body() {
    let app = test_app();
    let response = app
        .oneshot(frame_request("frame", b"this is not an image"))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn missing_frame_field_returns_400() {
    let app = test_app();
    let response = app
        .oneshot(frame_request("something_else", &png_frame(32, 32)))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn same_frame_twice_yields_same_detection_count() {
    let app = test_app();
    let png = png_frame(48, 48);

    let mut counts = Vec::new();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(frame_request("frame", &png))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::OK);
        counts.push(
            response
                .headers()
                .get("X-Detections")
                .unwrap()
                .to_str()
                .unwrap()
                .to_string(),
        );
    }
    assert_eq!(counts[0], counts[1]);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.expect("body").to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn home_serves_html() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("framelens"));
}

#[tokio::test]
async fn static_path_traversal_is_rejected() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/static/..%2Fsecret.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request");

    // Either the traversal guard or the router's path handling must stop
    // this; anything but a file body is acceptable.
    assert_ne!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_multipart_upload_is_rejected() {
    let app = test_app();
    let response = app
        .oneshot(json_request("/process-frame", r#"{"frame": "nope"}"#))
        .await
        .expect("request");

    assert!(response.status().is_client_error());
}
