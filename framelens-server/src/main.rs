// framelensd - frame annotation service daemon

use clap::Parser;
use framelens_core::ServiceConfig;
use framelens_server::{create_router, AppState};
use framelens_vision::YoloSegDetector;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "framelensd", about = "Frame annotation service", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Override the ONNX model path
    #[arg(long)]
    model: Option<PathBuf>,

    /// Override the static asset directory
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if let Some(static_dir) = cli.static_dir {
        config.static_dir = static_dir;
    }
    config.validate()?;

    info!("Loading segmentation model from {:?}", config.model_path);
    let detector = YoloSegDetector::load(&config.model_path, config.inference.clone())?;
    info!("Model ready");

    let port = config.port;
    let state = AppState::new(Arc::new(detector), config);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown handler: {}", e);
    }
    info!("Shutdown signal received");
}
