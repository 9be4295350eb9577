//! Timeslicer Server Binary
//!
//! Loads `config/<env>.toml`, opens the store and serves the HTTP API.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use timeslicer::network::{self, AppState};
use timeslicer::{AppConfig, DaySlicer, Engine, SliceStore};
use tracing_subscriber::{fmt, EnvFilter};

/// Timeslicer Server
#[derive(Parser, Debug)]
#[command(name = "timeslicer-server")]
#[command(about = "Track what you did with each slice of your day")]
#[command(version)]
struct Args {
    /// Directory holding <env>.toml config files
    #[arg(short, long, default_value = "./config")]
    config_dir: PathBuf,

    /// Config environment to load
    #[arg(short, long, env = "TIMESLICER_ENV", default_value = "dev")]
    env: String,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Store directory (defaults to ~/.config/timeslicer)
    #[arg(short, long)]
    store_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,timeslicer=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Timeslicer Server v{}", timeslicer::VERSION);
    tracing::info!("Config: {}/{}.toml", args.config_dir.display(), args.env);

    let app_config = AppConfig::load_env(&args.config_dir, &args.env)
        .context("failed to load configuration")?;

    let mut store_config = app_config.store_config();
    if let Some(dir) = &args.store_dir {
        store_config = store_config.store_dir(dir);
    }

    let engine = Engine::open(store_config.build()).context("failed to initialise store")?;
    tracing::info!("Store directory: {}", engine.layout().dir().display());

    let slicer = DaySlicer::from_config(&app_config.timeslice)
        .context("invalid timeslice configuration")?;

    let port = args.port.unwrap_or(app_config.port);
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let state = AppState::new(SliceStore::new(engine), slicer);

    network::serve(addr, state, shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, initiating shutdown...");
}
