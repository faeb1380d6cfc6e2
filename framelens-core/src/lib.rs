pub mod color;
pub mod config;
pub mod error;

pub use color::Color;
pub use config::{InferenceConfig, ServiceConfig};
pub use error::{Error, Result};
