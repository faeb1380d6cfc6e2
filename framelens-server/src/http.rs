//! HTTP routes for the frame annotation service

use crate::state::AppState;
use crate::static_files;
use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, Response, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use framelens_api::{
    HealthResponse, SetMaskColorRequest, SetMaskColorResponse, StatusResponse, DETECTIONS_HEADER,
};
use framelens_core::Color;
use framelens_vision::{annotate_frame, decode_frame, encode_frame, VisionError};
use tracing::{debug, error, info};

/// Create the HTTP router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/process-frame", post(process_frame_handler))
        .route("/set-mask-color", post(set_mask_color_handler))
        .route("/static/*path", get(static_files::serve_static))
        .with_state(state)
}

/// Serve the viewer page from the static directory, with an inline
/// fallback when the file is absent.
async fn home_handler(State(state): State<AppState>) -> Html<String> {
    let index = state.config.static_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(body) => Html(body),
        Err(_) => Html(
            "<!DOCTYPE html><html><body><p>framelens is running. \
             POST a frame to /process-frame.</p></body></html>"
                .to_string(),
        ),
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Accept a multipart frame upload, run detection, and return the
/// annotated, re-encoded frame with a detection-count header.
async fn process_frame_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response<Body> {
    let mut frame_bytes = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("frame") {
                    match field.bytes().await {
                        Ok(bytes) => {
                            frame_bytes = Some(bytes);
                            break;
                        }
                        Err(e) => {
                            debug!("Failed to read frame field: {}", e);
                            return empty_response(StatusCode::BAD_REQUEST);
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Malformed multipart body: {}", e);
                return empty_response(StatusCode::BAD_REQUEST);
            }
        }
    }

    let Some(frame_bytes) = frame_bytes else {
        debug!("Multipart body had no frame field");
        return empty_response(StatusCode::BAD_REQUEST);
    };

    // Snapshot the overlay color once so a concurrent update cannot tear
    // a single frame's annotation.
    let color = *state.overlay_color.read();
    let detector = state.detector.clone();
    let config = state.config.clone();

    // Decode, inference, and encode are CPU-bound; keep them off the
    // async workers.
    let result = tokio::task::spawn_blocking(move || {
        let mut frame = decode_frame(&frame_bytes)?;
        let detections = detector.detect(&frame)?;
        annotate_frame(&mut frame, &detections, detector.as_ref(), color, &config.inference);
        let encoded = encode_frame(&frame)?;
        Ok::<_, VisionError>((encoded, detections.len()))
    })
    .await;

    match result {
        Ok(Ok((encoded, count))) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, encoded.content_type)
            .header(DETECTIONS_HEADER, count.to_string())
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from(encoded.bytes))
            .unwrap_or_else(|_| empty_response(StatusCode::INTERNAL_SERVER_ERROR)),
        Ok(Err(VisionError::Decode(reason))) => {
            debug!("Rejecting undecodable frame: {}", reason);
            empty_response(StatusCode::BAD_REQUEST)
        }
        Ok(Err(e)) => {
            error!("Error processing frame: {}", e);
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            error!("Frame processing task failed: {}", e);
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Replace the process-wide overlay color. Accepts `{"rgb": [r, g, b]}`
/// and echoes the stored color back in BGR order. Anything else is
/// rejected without touching the stored color.
async fn set_mask_color_handler(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Response<Body> {
    // Deserialization enforces integer components in 0..=255; the only
    // extra check is the length-3 shape.
    let request = serde_json::from_value::<SetMaskColorRequest>(payload.clone())
        .ok()
        .filter(|request| request.rgb.len() == 3);

    match request {
        Some(request) => {
            let color = Color::from_rgb([request.rgb[0], request.rgb[1], request.rgb[2]]);
            *state.overlay_color.write() = color;
            info!("Overlay color set to BGR {:?}", color.to_bgr_array());
            Json(SetMaskColorResponse::ok(color)).into_response()
        }
        None => {
            debug!("Rejecting malformed mask color payload: {}", payload);
            (StatusCode::UNPROCESSABLE_ENTITY, Json(StatusResponse::error())).into_response()
        }
    }
}

fn empty_response(status: StatusCode) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .unwrap_or_else(|_| {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}
