//! Shared application state

use framelens_core::{Color, ServiceConfig};
use framelens_vision::Detector;
use parking_lot::RwLock;
use std::sync::Arc;

/// State shared across all request handlers.
///
/// The overlay color outlives any single request; everything else a
/// request touches is request-scoped. The lock guarantees a handler reads
/// a consistent color snapshot even while an update is in flight.
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<dyn Detector>,
    pub overlay_color: Arc<RwLock<Color>>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(detector: Arc<dyn Detector>, config: ServiceConfig) -> Self {
        Self {
            detector,
            overlay_color: Arc::new(RwLock::new(Color::default())),
            config: Arc::new(config),
        }
    }
}
