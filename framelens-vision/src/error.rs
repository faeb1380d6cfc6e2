//! Error types for framelens-vision

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("ONNX Runtime error: {0}")]
    Ort(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_error_display() {
        let err = VisionError::Decode("not an image".to_string());
        assert!(err.to_string().contains("Decode error"));
        assert!(err.to_string().contains("not an image"));
    }

    #[test]
    fn test_vision_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing model");
        let err: VisionError = io_err.into();
        match err {
            VisionError::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }
}
