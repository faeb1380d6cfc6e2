//! framelens-server: HTTP surface for the frame annotation service

pub mod http;
pub mod state;
pub mod static_files;

pub use http::create_router;
pub use state::AppState;
