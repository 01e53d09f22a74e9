use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::info;

mod config;
mod dispatch;
mod pacer;
mod server;
mod shutdown;

use config::HostConfig;

#[derive(Parser)]
#[command(name = "spyglass-host", about = "Spyglass remote desktop host")]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (IP), overrides config
    #[arg(long)]
    host: Option<String>,

    /// Video stream port, overrides config
    #[arg(long)]
    video_port: Option<u16>,

    /// Control channel port, overrides config
    #[arg(long)]
    control_port: Option<u16>,

    /// Target frame rate (1-60), overrides config
    #[arg(long)]
    fps: Option<u32>,

    /// Downscale factor in (0, 1], overrides config
    #[arg(long)]
    scale: Option<f32>,

    /// JPEG quality (1-100), overrides config
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Path to the 32-byte pre-shared key file, overrides config
    #[arg(long)]
    key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spyglass_host=info".into()),
        )
        .init();

    let args = Args::parse();

    // Load config
    let mut config = if let Some(config_path) = &args.config {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;
        toml::from_str(&content)?
    } else {
        HostConfig::default()
    };

    // CLI overrides
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.video_port {
        config.video_port = port;
    }
    if let Some(port) = args.control_port {
        config.control_port = port;
    }
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(scale) = args.scale {
        config.scale = scale;
    }
    if let Some(quality) = args.jpeg_quality {
        config.jpeg_quality = quality;
    }
    if let Some(key) = args.key {
        config.key_path = key;
    }

    config.validate()?;

    let key = spyglass_crypto::load_or_create(&config.key_path)
        .with_context(|| format!("failed to load key from {}", config.key_path.display()))?;

    info!(
        host = %config.host,
        video_port = config.video_port,
        control_port = config.control_port,
        fps = config.fps,
        scale = config.scale,
        "spyglass host starting"
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            let _ = stop_tx.send(true);
        }
    });

    server::run(config, key, stop_rx).await
}
