//! Cycle Summarization
//!
//! Derives the cycle's metrics from the sample window:
//!
//! - per-node block height and consensus state code (newest snapshot)
//! - the reference node — greatest reported height, rank order breaking ties
//! - per-node block time from the newest-vs-oldest height delta, only once
//!   the window is full
//! - the network transaction tally, read from the reference node's sample
//!   (every node reports the same ledger, so summing would double count)
//!
//! [`summarize`] is pure; [`emit`] pushes the result into the metric series.
//! Both run once per cycle and the summary is discarded afterwards.

use tracing::warn;

use crate::api::ExporterMetrics;
use crate::registry::NodeRegistry;
use crate::types::{BlockNumber, ConsensusState, TxCount};
use crate::window::SampleWindow;

/// The most-advanced node of the current cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceNode {
    pub name: String,
    pub address: String,
    pub endpoint: String,
    pub block_height: BlockNumber,
    pub total_tx: TxCount,
}

/// One node's derived block time
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBlockTime {
    pub name: String,
    pub address: String,
    pub endpoint: String,
    pub seconds: f64,
}

/// Everything derived from one cycle; recomputed every cycle, never retained
#[derive(Debug, Clone, Default)]
pub struct CycleSummary {
    /// Newest reported height per answering node, rank order
    pub heights: Vec<(String, BlockNumber)>,

    /// Recognized consensus states, rank order
    pub states: Vec<(String, ConsensusState)>,

    /// Nodes whose reported state fell outside the codebook (name, raw state)
    pub unrecognized_states: Vec<(String, String)>,

    /// Reference node; `None` when no node answered this cycle
    pub reference: Option<ReferenceNode>,

    /// Block time estimates; empty until the window is full
    pub block_times: Vec<NodeBlockTime>,
}

/// Derive the cycle summary from the registry and window
///
/// Iteration follows registry rank order throughout, so reference selection
/// is deterministic: only a strictly greater height displaces the candidate,
/// and ties resolve to the higher-ranked node.
pub fn summarize(
    registry: &NodeRegistry,
    window: &SampleWindow,
    poll_interval_secs: f64,
) -> CycleSummary {
    let mut summary = CycleSummary::default();

    let newest = match window.newest() {
        Some(snapshot) => snapshot,
        None => return summary,
    };

    for node in registry.nodes() {
        let sample = match SampleWindow::find(&node.api_endpoint, newest) {
            Some(sample) => sample,
            None => continue,
        };

        summary.heights.push((node.name.clone(), sample.block_height));

        match ConsensusState::parse(&sample.state) {
            Ok(state) => summary.states.push((node.name.clone(), state)),
            Err(_) => summary
                .unrecognized_states
                .push((node.name.clone(), sample.state.clone())),
        }

        let displaces = summary
            .reference
            .as_ref()
            .map_or(true, |r| sample.block_height > r.block_height);
        if displaces {
            summary.reference = Some(ReferenceNode {
                name: node.name.clone(),
                address: node.address.clone(),
                endpoint: node.api_endpoint.clone(),
                block_height: sample.block_height,
                total_tx: sample.total_tx,
            });
        }
    }

    // Rates need the full window's worth of nominal elapsed time
    if let Some(oldest) = window.oldest() {
        let elapsed_secs = poll_interval_secs * window.retention() as f64;

        for node in registry.nodes() {
            let newest_sample = match SampleWindow::find(&node.api_endpoint, newest) {
                Some(sample) => sample,
                None => continue,
            };
            let oldest_sample = match SampleWindow::find(&node.api_endpoint, oldest) {
                Some(sample) => sample,
                None => continue,
            };

            // A non-advancing or regressed height has no meaningful rate
            if newest_sample.block_height <= oldest_sample.block_height {
                continue;
            }
            let delta = newest_sample.block_height - oldest_sample.block_height;

            summary.block_times.push(NodeBlockTime {
                name: node.name.clone(),
                address: node.address.clone(),
                endpoint: node.api_endpoint.clone(),
                seconds: elapsed_secs / delta as f64,
            });
        }
    }

    summary
}

/// Push a cycle summary into the metric series
pub fn emit(summary: &CycleSummary, metrics: &ExporterMetrics) {
    for (name, height) in &summary.heights {
        metrics.set_node_block_height(name, *height);
    }

    for (name, state) in &summary.states {
        metrics.set_node_state(name, state.code());
    }

    for (name, raw) in &summary.unrecognized_states {
        warn!("node {} reported unrecognized state {:?}", name, raw);
        metrics.inc_state_unrecognized(name);
    }

    if let Some(reference) = &summary.reference {
        metrics.set_highest_block(reference.block_height);
        metrics.set_total_tx(reference.total_tx);
    }

    for bt in &summary.block_times {
        metrics.set_node_block_time(&bt.name, bt.seconds);

        if summary
            .reference
            .as_ref()
            .is_some_and(|r| r.endpoint == bt.endpoint)
        {
            metrics.set_reference_block_time(&bt.name, &bt.address, bt.seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeDescriptor, Sample, SnapshotSet};
    use chrono::Utc;

    fn endpoint(rank: usize) -> String {
        format!("http://10.0.0.{}:9000/api/v1/status/peer", rank)
    }

    fn registry_of(names: &[&str]) -> NodeRegistry {
        let mut registry = NodeRegistry::new(60);
        registry.replace(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| NodeDescriptor {
                    name: name.to_string(),
                    address: format!("hx{:02}", i + 1),
                    api_endpoint: endpoint(i + 1),
                    rank: i + 1,
                })
                .collect(),
        );
        registry
    }

    fn snapshot_of(heights: &[(usize, u64)]) -> SnapshotSet {
        snapshot_with_state(heights, "Vote")
    }

    fn snapshot_with_state(heights: &[(usize, u64)], state: &str) -> SnapshotSet {
        let mut set = SnapshotSet::new();
        for (rank, height) in heights {
            set.insert(Sample {
                endpoint: endpoint(*rank),
                block_height: *height,
                state: state.to_string(),
                total_tx: height * 10,
                captured_at: Utc::now(),
            });
        }
        set
    }

    #[test]
    fn test_reference_is_max_height() {
        let registry = registry_of(&["a", "b", "c"]);
        let mut window = SampleWindow::new(5);
        window.push(snapshot_of(&[(1, 100), (2, 105), (3, 103)]));

        let summary = summarize(&registry, &window, 0.5);
        let reference = summary.reference.unwrap();
        assert_eq!(reference.name, "b");
        assert_eq!(reference.block_height, 105);
        // tally comes from the reference node's view, not a sum
        assert_eq!(reference.total_tx, 1050);
    }

    #[test]
    fn test_reference_tie_breaks_to_higher_rank() {
        let registry = registry_of(&["a", "b", "c"]);
        let mut window = SampleWindow::new(5);
        window.push(snapshot_of(&[(1, 100), (2, 105), (3, 105)]));

        let summary = summarize(&registry, &window, 0.5);
        assert_eq!(summary.reference.as_ref().unwrap().name, "b");

        // idempotent for identical input
        let again = summarize(&registry, &window, 0.5);
        assert_eq!(again.reference, summary.reference);
    }

    #[test]
    fn test_empty_snapshot_has_no_reference() {
        let registry = registry_of(&["a", "b"]);
        let mut window = SampleWindow::new(5);
        window.push(SnapshotSet::new());

        let summary = summarize(&registry, &window, 0.5);
        assert!(summary.reference.is_none());
        assert!(summary.heights.is_empty());
        assert!(summary.block_times.is_empty());
    }

    #[test]
    fn test_no_rates_until_window_full() {
        let registry = registry_of(&["a"]);
        let mut window = SampleWindow::new(5);

        for i in 0..4u64 {
            window.push(snapshot_of(&[(1, 100 + i)]));
            let summary = summarize(&registry, &window, 0.5);
            assert!(summary.block_times.is_empty());
        }

        window.push(snapshot_of(&[(1, 105)]));
        let summary = summarize(&registry, &window, 0.5);
        assert_eq!(summary.block_times.len(), 1);
    }

    #[test]
    fn test_rate_formula() {
        // pollInterval=0.5, retention=5, 100 -> 105 => (0.5*5)/5 = 0.5
        let registry = registry_of(&["a"]);
        let mut window = SampleWindow::new(5);
        for h in [100, 101, 102, 103, 105] {
            window.push(snapshot_of(&[(1, h)]));
        }

        let summary = summarize(&registry, &window, 0.5);
        let bt = &summary.block_times[0];
        assert!((bt.seconds - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stalled_height_emits_no_rate() {
        let registry = registry_of(&["a"]);
        let mut window = SampleWindow::new(5);
        for _ in 0..5 {
            window.push(snapshot_of(&[(1, 100)]));
        }

        let summary = summarize(&registry, &window, 0.5);
        assert!(summary.block_times.is_empty());
    }

    #[test]
    fn test_node_missing_from_either_end_emits_no_rate() {
        let registry = registry_of(&["a", "b"]);
        let mut window = SampleWindow::new(3);

        // node b missing from the oldest cycle
        window.push(snapshot_of(&[(1, 100)]));
        window.push(snapshot_of(&[(1, 101), (2, 201)]));
        window.push(snapshot_of(&[(1, 102), (2, 202)]));

        let summary = summarize(&registry, &window, 1.0);
        assert_eq!(summary.block_times.len(), 1);
        assert_eq!(summary.block_times[0].name, "a");
    }

    #[test]
    fn test_block_time_over_full_window() {
        // heights 100 -> 103 over a 5-cycle window at 1s interval
        let registry = registry_of(&["a"]);
        let mut window = SampleWindow::new(5);
        for h in [100, 101, 101, 102, 103] {
            window.push(snapshot_of(&[(1, h)]));
        }

        let summary = summarize(&registry, &window, 1.0);
        let bt = &summary.block_times[0];
        assert!((bt.seconds - 5.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrecognized_state_is_collected() {
        let registry = registry_of(&["a"]);
        let mut window = SampleWindow::new(5);
        window.push(snapshot_with_state(&[(1, 100)], "LeaderComplain"));

        let summary = summarize(&registry, &window, 0.5);
        assert!(summary.states.is_empty());
        assert_eq!(
            summary.unrecognized_states,
            vec![("a".to_string(), "LeaderComplain".to_string())]
        );
    }

    #[test]
    fn test_emit_writes_series() {
        let registry = registry_of(&["a", "b"]);
        let mut window = SampleWindow::new(2);
        window.push(snapshot_of(&[(1, 100), (2, 90)]));
        window.push(snapshot_of(&[(1, 102), (2, 90)]));

        let metrics = ExporterMetrics::new();
        let summary = summarize(&registry, &window, 1.0);
        emit(&summary, &metrics);

        let output = metrics.gather().unwrap();
        assert!(output.contains("icon_preps_block_height{name=\"a\"} 102"));
        assert!(output.contains("icon_highest_block 102"));
        assert!(output.contains("icon_total_tx 1020"));
        // a advanced 2 blocks over a 2-cycle window at 1s: (1*2)/2 = 1s
        assert!(output.contains("icon_preps_block_time_seconds{name=\"a\"} 1"));
        // a is the reference, so the reference-labeled series exists too
        assert!(output
            .contains("icon_node_reference_block_time_seconds{address=\"hx01\",name=\"a\"} 1"));
        // b never advanced: no rate series for it
        assert!(!output.contains("icon_preps_block_time_seconds{name=\"b\"}"));
    }
}
