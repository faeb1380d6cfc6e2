//! Frame decoding and encoding
//!
//! Frames arrive as encoded image bytes (whatever the client's camera or
//! canvas produced) and leave as WebP, falling back to JPEG when WebP
//! encoding fails. Quality is fixed at 85 for both codecs.

use crate::error::VisionError;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::io::Cursor;
use tracing::{debug, warn};

/// Encoding quality for annotated output frames.
const OUTPUT_QUALITY: u8 = 85;

/// An encoded output frame together with its media type.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Decode raw request bytes into an RGB pixel buffer.
///
/// Bytes that do not form a valid image are an input error, reported
/// distinctly from downstream inference or encoding failures.
pub fn decode_frame(bytes: &[u8]) -> Result<RgbImage, VisionError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| VisionError::Decode(format!("Could not decode frame: {}", e)))?;
    let rgb = img.into_rgb8();
    debug!("Decoded frame {}x{}", rgb.width(), rgb.height());
    Ok(rgb)
}

/// Encode an annotated frame to WebP at quality 85, falling back to JPEG
/// at the same quality if the WebP encoder rejects the buffer.
pub fn encode_frame(img: &RgbImage) -> Result<EncodedFrame, VisionError> {
    let encoder = webp::Encoder::from_rgb(img.as_raw(), img.width(), img.height());
    match encoder.encode_simple(false, OUTPUT_QUALITY as f32) {
        Ok(memory) => Ok(EncodedFrame {
            bytes: memory.to_vec(),
            content_type: "image/webp",
        }),
        Err(e) => {
            warn!("WebP encoding failed ({:?}), falling back to JPEG", e);
            encode_jpeg(img)
        }
    }
}

fn encode_jpeg(img: &RgbImage) -> Result<EncodedFrame, VisionError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), OUTPUT_QUALITY);
    img.write_with_encoder(encoder)
        .map_err(|e| VisionError::Encode(format!("JPEG encoding failed: {}", e)))?;
    Ok(EncodedFrame {
        bytes,
        content_type: "image/jpeg",
    })
}
