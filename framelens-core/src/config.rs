//! Configuration for the frame annotation service

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fixed inference parameters handed to the detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Square model input size in pixels.
    pub image_size: u32,
    /// Minimum confidence for a detection to be kept.
    pub confidence: f32,
    /// IoU threshold for non-max suppression.
    pub iou: f32,
    /// Merge overlapping detections across classes.
    pub agnostic_nms: bool,
    /// Hard cap on detections per frame.
    pub max_detections: usize,
    /// Mask probability threshold for the binary overlay.
    pub mask_threshold: f32,
    /// Opacity of the blended mask overlay.
    pub mask_alpha: f32,
    /// Bounding box line thickness in pixels.
    pub box_thickness: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            image_size: 320,
            confidence: 0.25,
            iou: 0.5,
            agnostic_nms: true,
            max_detections: 20,
            mask_threshold: 0.5,
            mask_alpha: 0.4,
            box_thickness: 2,
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// TCP port the HTTP server binds on.
    pub port: u16,
    /// Path to the ONNX segmentation model.
    pub model_path: PathBuf,
    /// Directory served under /static.
    pub static_dir: PathBuf,
    /// Inference parameters.
    pub inference: InferenceConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            model_path: PathBuf::from("models/framelens-seg.onnx"),
            static_dir: PathBuf::from("static"),
            inference: InferenceConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration: defaults, then an optional TOML file, then
    /// `FRAMELENS_*` environment variables. Later sources win.
    pub fn load(file: Option<&str>) -> Result<Self, Error> {
        let defaults = config::Config::try_from(&ServiceConfig::default())
            .map_err(|e| Error::Configuration(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("FRAMELENS").separator("__"))
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        let config: ServiceConfig = settings
            .try_deserialize()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.port == 0 {
            return Err(Error::Configuration("Port must be non-zero".to_string()));
        }

        let inf = &self.inference;

        if inf.image_size == 0 || inf.image_size > 4096 {
            return Err(Error::Configuration(
                "Image size must be between 1 and 4096".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&inf.confidence) {
            return Err(Error::Configuration(
                "Confidence threshold must be within [0, 1]".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&inf.iou) {
            return Err(Error::Configuration(
                "IoU threshold must be within [0, 1]".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&inf.mask_threshold) {
            return Err(Error::Configuration(
                "Mask threshold must be within [0, 1]".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&inf.mask_alpha) {
            return Err(Error::Configuration(
                "Mask alpha must be within [0, 1]".to_string(),
            ));
        }

        if inf.max_detections == 0 || inf.max_detections > 1000 {
            return Err(Error::Configuration(
                "Max detections must be between 1 and 1000".to_string(),
            ));
        }

        if inf.box_thickness == 0 || inf.box_thickness > 32 {
            return Err(Error::Configuration(
                "Box thickness must be between 1 and 32".to_string(),
            ));
        }

        Ok(())
    }
}
