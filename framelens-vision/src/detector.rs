//! Detector trait and result types
//!
//! The segmentation model is an external collaborator behind the
//! [`Detector`] trait, so the HTTP layer can run against the ONNX backend
//! in production and a canned stub in tests.

use crate::error::VisionError;
use image::RgbImage;

/// Axis-aligned bounding box in pixel coordinates of the original frame.
#[derive(Debug, Clone, Copy)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// IoU (intersection over union) with another box.
    pub fn iou(&self, other: &BBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let union = self.width() * self.height() + other.width() * other.height() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }

    /// Clamp the box to frame bounds.
    pub fn clamp_to(&self, width: u32, height: u32) -> BBox {
        BBox {
            x1: self.x1.clamp(0.0, width as f32),
            y1: self.y1.clamp(0.0, height as f32),
            x2: self.x2.clamp(0.0, width as f32),
            y2: self.y2.clamp(0.0, height as f32),
        }
    }
}

/// Per-pixel mask probabilities at the model's prototype resolution.
///
/// Masks are kept at prototype resolution and resized to frame dimensions
/// only when drawn (retina-masks-off semantics).
#[derive(Debug, Clone)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl Mask {
    pub fn probability(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }
}

/// One model output: bounding box, confidence, class, optional mask.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: BBox,
    pub confidence: f32,
    pub class_id: usize,
    pub mask: Option<Mask>,
}

/// Detection capability behind which the pretrained model sits.
///
/// Implementations must be safe to share across concurrent requests.
pub trait Detector: Send + Sync {
    /// Run detection and segmentation on a decoded frame.
    ///
    /// Returned order is the draw order; callers must not reorder.
    fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>, VisionError>;

    /// Human-readable class name for a class index.
    fn class_name(&self, class_id: usize) -> &str;
}

/// Stub detector for tests: returns the same canned detections for every
/// frame, scaled to the frame dimensions.
pub struct StubDetector {
    detections_per_frame: usize,
}

impl StubDetector {
    pub fn new(detections_per_frame: usize) -> Self {
        Self {
            detections_per_frame,
        }
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Detector for StubDetector {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>, VisionError> {
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let mut detections = Vec::with_capacity(self.detections_per_frame);

        for i in 0..self.detections_per_frame {
            let offset = (i as f32 + 1.0) / (self.detections_per_frame as f32 + 2.0);
            // Uniform probabilities comfortably above the draw threshold.
            let mask = Mask {
                width: 8,
                height: 8,
                data: vec![0.75; 64],
            };
            detections.push(Detection {
                bbox: BBox {
                    x1: w * offset * 0.5,
                    y1: h * offset * 0.5,
                    x2: (w * offset * 0.5 + w * 0.25).min(w),
                    y2: (h * offset * 0.5 + h * 0.25).min(h),
                },
                confidence: 0.9 - 0.1 * i as f32,
                class_id: i,
                mask: Some(mask),
            });
        }

        Ok(detections)
    }

    fn class_name(&self, class_id: usize) -> &str {
        match class_id {
            0 => "stub-a",
            1 => "stub-b",
            _ => "stub",
        }
    }
}
