//! framelens-vision: frame codec, detection backends, and annotation
//!
//! The pretrained segmentation model sits behind the [`Detector`] trait;
//! everything else in this crate is request-scoped glue: decode a frame,
//! run the detector, draw the overlay, re-encode.

pub mod annotate;
pub mod detector;
pub mod error;
pub mod frame;
pub mod models;

pub use annotate::annotate_frame;
pub use detector::{BBox, Detection, Detector, Mask, StubDetector};
pub use error::VisionError;
pub use frame::{decode_frame, encode_frame, EncodedFrame};
pub use models::YoloSegDetector;
