// Allow dead code - some accessors are kept for API completeness
#![allow(dead_code)]

//! ICON Network Exporter
//!
//! Prometheus exporter for the ICON blockchain network: polls every
//! registered P-Rep node and derives health and performance metrics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ICON NETWORK EXPORTER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Node Registry       ←── ranked P-Rep list, refreshed      │
//! │                          from the directory service         │
//! │  Sample Collector    ←── concurrent status polls, bounded  │
//! │                          per-node timeout                   │
//! │  Sample Window       ←── last N cycle snapshots            │
//! │  Summarizer          ←── reference node, block times,      │
//! │                          state codes, tx tally              │
//! │  HTTP API (6100)     ←── /metrics, /health, /status        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};

mod api;
mod collector;
mod config;
mod error;
mod poller;
mod registry;
mod rpc;
mod summary;
mod types;
mod window;

use api::ExporterMetrics;
use config::ExporterConfig;
use poller::ExporterStatus;
use rpc::RpcClient;

/// Directory fetches get a generous fixed bound; node polls use the
/// configurable per-request timeout.
const DIRECTORY_TIMEOUT_SECS: u64 = 10;

/// ICON Network Exporter - P-Rep node health metrics for Prometheus
#[derive(Parser, Debug)]
#[command(name = "icon-network-exporter")]
#[command(version = "0.1.0")]
#[command(about = "Prometheus exporter for ICON network P-Rep nodes", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "exporter.toml")]
    config: PathBuf,

    /// Network to monitor (mainnet, zicon)
    #[arg(long)]
    network: Option<String>,

    /// Directory endpoint override
    #[arg(long)]
    directory_endpoint: Option<String>,

    /// Port to expose metrics on
    #[arg(long)]
    exporter_port: Option<u16>,

    /// Address to expose metrics on
    #[arg(long)]
    exporter_address: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .init();

    info!("🌐 ICON Network Exporter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = if args.config.exists() {
        ExporterConfig::load(&args.config)?
    } else {
        warn!("Config file not found, using defaults");
        ExporterConfig::default()
    };

    // Override config with CLI args
    let mut config = config.with_directory_endpoint(args.directory_endpoint);
    if let Some(network) = args.network {
        config = config.with_network(network.parse()?);
    }
    if let Some(port) = args.exporter_port {
        config = config.with_exporter_port(port);
    }
    if let Some(address) = args.exporter_address {
        config = config.with_exporter_address(address);
    }

    config.validate()?;

    info!("⚙️  Configuration:");
    info!("   Network: {:?}", config.network);
    info!("   Directory endpoint: {}", config.resolved_directory_endpoint());
    info!("   Exporter: {}:{}", config.exporter_address, config.exporter_port);
    info!("   Poll interval: {}s", config.poll_interval_secs);
    info!("   Poll timeout: {}s", config.poll_timeout_secs);
    info!("   Retention window: {} cycles", config.retention);
    info!("   List refresh: every {} cycles", config.refresh_prep_list_cycles);

    let config = Arc::new(config);

    let client = Arc::new(RpcClient::new(
        config.resolved_directory_endpoint(),
        std::time::Duration::from_secs(DIRECTORY_TIMEOUT_SECS),
    )?);
    let metrics = Arc::new(ExporterMetrics::new());
    let status = Arc::new(RwLock::new(ExporterStatus::default()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start services
    let mut api_handle = tokio::spawn(api::run_api_server(
        config.clone(),
        metrics.clone(),
        status.clone(),
    ));

    let mut poller_handle = tokio::spawn(poller::run_poller(
        config.clone(),
        client,
        metrics.clone(),
        status.clone(),
        shutdown_rx,
    ));

    info!("✅ Exporter started");
    info!("   Press Ctrl+C to shutdown gracefully");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutdown signal received");
            let _ = shutdown_tx.send(true);

            // let the in-flight cycle finish, then stop serving
            if let Err(e) = (&mut poller_handle).await {
                error!("Poller exited abnormally: {:?}", e);
            }
            api_handle.abort();
        }
        result = &mut poller_handle => {
            error!("Poller exited: {:?}", result);
        }
        result = &mut api_handle => {
            error!("HTTP API exited: {:?}", result);
        }
    }

    info!("👋 ICON Network Exporter shutting down");
    Ok(())
}
