//! Polling Control Loop
//!
//! A single loop drives the whole pipeline: refresh the registry when due,
//! fan out to every node, push the snapshot, summarize, emit. The loop is the
//! only writer of the registry and the window; the per-node query tasks only
//! fill their own result slot inside the collector.
//!
//! Cycles are strictly sequenced — a slow cycle delays the next tick, it is
//! never overlapped or skipped. Shutdown is honored before each fan-out: an
//! in-flight cycle finishes, no new one starts, and an abandoned cycle emits
//! nothing.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::ExporterMetrics;
use crate::collector;
use crate::config::ExporterConfig;
use crate::registry::NodeRegistry;
use crate::rpc::RpcClient;
use crate::summary;
use crate::window::SampleWindow;

/// Read-only snapshot of the loop's progress for the /status endpoint
#[derive(Debug, Clone, Default)]
pub struct ExporterStatus {
    pub cycles: u64,
    pub known_nodes: usize,
    pub last_cycle_samples: usize,
    pub highest_block: u64,
    pub window_len: usize,
    pub window_full: bool,
}

/// Run the polling loop until a shutdown signal arrives
pub async fn run_poller(
    config: Arc<ExporterConfig>,
    client: Arc<RpcClient>,
    metrics: Arc<ExporterMetrics>,
    status: Arc<RwLock<ExporterStatus>>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut registry = NodeRegistry::new(config.refresh_prep_list_cycles);
    let mut window = SampleWindow::new(config.retention);

    let mut interval = tokio::time::interval(config.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "🔁 polling every {}s, window of {} cycles, list refresh every {} cycles",
        config.poll_interval_secs, config.retention, config.refresh_prep_list_cycles
    );

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => {
                info!("poller stopping");
                return Ok(());
            }
            _ = interval.tick() => {}
        }

        run_cycle(&config, &client, &metrics, &status, &mut registry, &mut window).await;
    }
}

/// One polling cycle: refresh → collect → push → summarize → emit
///
/// A directory failure skips everything else — zero window pushes, zero
/// metrics for the cycle — and the next tick starts fresh.
pub async fn run_cycle(
    config: &ExporterConfig,
    client: &Arc<RpcClient>,
    metrics: &Arc<ExporterMetrics>,
    status: &Arc<RwLock<ExporterStatus>>,
    registry: &mut NodeRegistry,
    window: &mut SampleWindow,
) {
    if registry.refresh_due() {
        metrics.inc_directory_request();
        match client.get_preps().await {
            Ok(nodes) => {
                info!("🔄 refreshed P-Rep list: {} nodes", nodes.len());
                metrics.set_node_count(nodes.len());
                for node in &nodes {
                    metrics.set_node_rank(&node.name, &node.address, node.rank);
                }
                registry.replace(nodes);
            }
            Err(e) => {
                warn!("directory refresh failed, skipping cycle: {}", e);
                metrics.inc_directory_error();
                return;
            }
        }
    }

    let snapshot = collector::collect_snapshot(
        client.clone(),
        registry.nodes(),
        config.poll_timeout(),
        metrics.clone(),
    )
    .await;

    debug!(
        "cycle complete: {}/{} nodes answered",
        snapshot.len(),
        registry.len()
    );

    window.push(snapshot);
    registry.tick();

    let summary = summary::summarize(registry, window, config.poll_interval_secs);
    summary::emit(&summary, metrics);
    metrics.inc_cycle();

    let mut st = status.write().await;
    st.cycles += 1;
    st.known_nodes = registry.len();
    st.last_cycle_samples = window.newest().map(|s| s.len()).unwrap_or(0);
    st.highest_block = summary
        .reference
        .as_ref()
        .map(|r| r.block_height)
        .unwrap_or(st.highest_block);
    st.window_len = window.len();
    st.window_full = window.is_full();
}
