//! Sample Collector
//!
//! One polling cycle's fan-out: every known node is queried concurrently with
//! a bounded per-request timeout, so the cycle's wall-clock cost is bounded by
//! the timeout rather than by node count. Each task owns its own result slot;
//! results are merged by endpoint after the join.
//!
//! Per-node failures are data, not errors — a node that times out, returns a
//! bad status, or sends a malformed body is simply absent from the snapshot
//! and shows up in the poll outcome counter.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::debug;

use crate::api::ExporterMetrics;
use crate::rpc::RpcClient;
use crate::types::{NodeDescriptor, Sample, SnapshotSet};

/// Poll outcome labels
const OUTCOME_OK: &str = "ok";
const OUTCOME_ERROR: &str = "error";

/// Query every descriptor's status endpoint and gather the answers
///
/// Returns whatever subset succeeded — possibly empty. Never fails itself;
/// acquiring the descriptor list is the caller's concern.
pub async fn collect_snapshot(
    client: Arc<RpcClient>,
    nodes: &[NodeDescriptor],
    timeout: Duration,
    metrics: Arc<ExporterMetrics>,
) -> SnapshotSet {
    let mut tasks = JoinSet::new();

    for node in nodes {
        let client = client.clone();
        let metrics = metrics.clone();
        let node = node.clone();

        tasks.spawn(async move {
            match client.get_peer_status(&node.api_endpoint, timeout).await {
                Ok(status) => {
                    metrics.inc_node_poll(&node.name, OUTCOME_OK);
                    Some(Sample {
                        endpoint: node.api_endpoint,
                        block_height: status.block_height,
                        state: status.state,
                        total_tx: status.total_tx,
                        captured_at: Utc::now(),
                    })
                }
                Err(e) => {
                    debug!("status poll failed for {}: {}", node.name, e);
                    metrics.inc_node_poll(&node.name, OUTCOME_ERROR);
                    None
                }
            }
        });
    }

    let mut snapshot = SnapshotSet::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(sample)) => snapshot.insert(sample),
            Ok(None) => {}
            Err(e) => debug!("status poll task panicked: {}", e),
        }
    }

    snapshot
}
