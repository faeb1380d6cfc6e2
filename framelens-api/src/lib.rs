//! HTTP request/response types for the frame annotation service.

use framelens_core::Color;
use serde::{Deserialize, Serialize};

/// Response header carrying the detection count.
pub const DETECTIONS_HEADER: &str = "X-Detections";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetMaskColorRequest {
    pub rgb: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetMaskColorResponse {
    pub status: String,
    /// The stored color, echoed in BGR order.
    pub mask_color: [u8; 3],
}

impl SetMaskColorResponse {
    pub fn ok(color: Color) -> Self {
        Self {
            status: "ok".to_string(),
            mask_color: color.to_bgr_array(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn error() -> Self {
        Self {
            status: "error".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
