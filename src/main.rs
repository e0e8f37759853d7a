//! Leakwatch server
//!
//! Loads configuration, connects to the report store, keeps the dashboard
//! live in a background session and serves the HTML page plus JSON API.

use anyhow::Context;
use clap::Parser;
use leakwatch::api::{self, AppState};
use leakwatch::config::{Config, LoadedConfig, LoggingConfig};
use leakwatch::dashboard::{DashboardController, DashboardSession};
use leakwatch::store::{MemoryStore, ReportStore, RestStore};
use leakwatch::websocket::ConnectionHub;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "leakwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live dashboard for water leak reports")]
struct Args {
    /// Config file (default: platform config dir, then environment only)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve built-in sample reports instead of the hosted backend
    #[arg(long)]
    demo: bool,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => LoadedConfig {
            config: Config::load_with_env(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            source: Some(path.clone()),
            skipped: Vec::new(),
        },
        None => Config::discover(),
    };
    let mut config = loaded.config;
    if args.demo {
        config.backend.demo = true;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    config.validate().context("invalid configuration")?;

    init_logging(&config.logging);

    tracing::info!("Leakwatch v{}", env!("CARGO_PKG_VERSION"));
    for error in &loaded.skipped {
        tracing::warn!(error = %error, "Skipped unreadable config file");
    }
    match &loaded.source {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using default config with environment overrides"),
    }

    let store: Arc<dyn ReportStore> = if config.backend.demo {
        tracing::warn!("Demo mode: serving sample reports from memory");
        Arc::new(MemoryStore::demo())
    } else {
        let rest = RestStore::new(config.rest_store_config(), config.realtime_config())
            .context("creating report store client")?;
        tracing::info!(table = %config.backend.table, "Using hosted report store");
        Arc::new(rest)
    };

    let hub = Arc::new(ConnectionHub::new(config.hub_config()));
    let controller = Arc::new(DashboardController::new(
        store,
        Arc::clone(&hub),
        config.controller_settings(),
    ));

    let session = DashboardSession::new(Arc::clone(&controller), config.session_config()).spawn();

    let state = AppState::new(controller, hub, config.api.clone());
    let served = api::serve(state, &config.api).await;

    tracing::info!("Shutting down...");
    session.shutdown().await;

    served.context("HTTP server failed")?;
    tracing::info!("Leakwatch shutdown complete");
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("leakwatch={},tower_http=info", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
