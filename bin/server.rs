// LavandeRio Analytics - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lavanderio_analytics::api::{build_router, AppState};
use lavanderio_analytics::config::{DATA_DIR_ENV, DEFAULT_DATA_DIR};
use lavanderio_analytics::DataConfig;

#[derive(Parser, Debug)]
#[command(name = "lavanderio-server")]
#[command(about = "HTTP API for the LavandeRio analytics")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "LAVANDERIO_PORT")]
    port: u16,

    /// Directory holding the CSV tables and the company context
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lavanderio_analytics=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if !args.data_dir.is_dir() {
        anyhow::bail!("Data directory not found: {}", args.data_dir.display());
    }
    info!("Data directory: {}", args.data_dir.display());

    let state = AppState::new(DataConfig::new(args.data_dir));
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("🚀 Server running on http://localhost:{}", args.port);
    info!("   API: http://localhost:{}/api/health", args.port);

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
