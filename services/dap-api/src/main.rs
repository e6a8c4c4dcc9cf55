//! DAP API Server
//!
//! OPeNDAP (DAP2) access to Zarr datasets for netCDF-aware clients.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use dap_api::config::DapConfig;
use dap_api::router::build_router;
use dap_api::state::AppState;

/// DAP API Server
#[derive(Parser, Debug)]
#[command(name = "dap-api")]
#[command(about = "OPeNDAP (DAP2) server for Zarr weather data")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "DAP_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (overrides the configuration file)
    #[arg(short, long, env = "DAP_LISTEN_ADDR")]
    listen: Option<String>,

    /// Data root (overrides the configuration file)
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "DAP_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = DapConfig::load(args.config.as_deref())?;
    if let Some(listen) = &args.listen {
        config.listen = listen.clone();
    }
    if let Some(root) = &args.data_root {
        config.data_root = root.clone();
    }
    if args.worker_threads.is_some() {
        config.worker_threads = args.worker_threads;
    }

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = config.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args, config))
}

async fn run_server(args: Args, config: DapConfig) -> anyhow::Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    // Initialize Prometheus metrics exporter
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Prometheus metrics exporter initialized");
    info!(
        "Starting DAP API server, data root {:?}, revision {}",
        config.data_root, config.build_revision
    );

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.listen))?;

    let state = Arc::new(AppState::new(config).with_metrics(prometheus_handle));
    let app = build_router(state);

    info!("DAP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
