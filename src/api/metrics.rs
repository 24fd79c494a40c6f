//! Metrics Collection
//!
//! Labeled gauges and counters behind an owned [`Registry`] — no process-wide
//! statics, the whole set is passed by reference through the polling loop and
//! rendered on demand by the HTTP API.

use prometheus::{
    Encoder, Gauge, GaugeVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::time::Instant;

/// Metrics collector for the exporter
pub struct ExporterMetrics {
    registry: Registry,

    /// Start time for uptime calculation
    start_time: Instant,

    // === Per-node series ===
    node_block_height: IntGaugeVec,
    node_rank: IntGaugeVec,
    node_state: IntGaugeVec,
    node_block_time: GaugeVec,
    node_poll: IntCounterVec,
    state_unrecognized: IntCounterVec,

    // === Network-wide series ===
    node_count: IntGauge,
    highest_block: IntGauge,
    total_tx: IntGauge,
    reference_block_time: GaugeVec,

    // === Exporter self-observation ===
    directory_requests: IntCounter,
    directory_errors: IntCounter,
    cycles: IntCounter,
    uptime: Gauge,
}

impl ExporterMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let node_block_height = IntGaugeVec::new(
            Opts::new("icon_preps_block_height", "Block height reported by a P-Rep node"),
            &["name"],
        )
        .expect("build block height gauge");

        let node_rank = IntGaugeVec::new(
            Opts::new("icon_preps_node_rank", "Stake rank of a P-Rep node"),
            &["name", "address"],
        )
        .expect("build rank gauge");

        let node_state = IntGaugeVec::new(
            Opts::new(
                "icon_preps_node_state",
                "Consensus state code (0=BlockGenerate, 1=Vote, 2=Watch, 3=SubscribeNetwork, \
                 4=BlockSync, 5=EvaluateNetwork, 6=InitComponents)",
            ),
            &["name"],
        )
        .expect("build state gauge");

        let node_block_time = GaugeVec::new(
            Opts::new(
                "icon_preps_block_time_seconds",
                "Estimated seconds per block over the retention window",
            ),
            &["name"],
        )
        .expect("build block time gauge");

        let node_poll = IntCounterVec::new(
            Opts::new("icon_node_poll_total", "Status poll outcomes per node"),
            &["name", "outcome"],
        )
        .expect("build poll counter");

        let state_unrecognized = IntCounterVec::new(
            Opts::new(
                "icon_node_state_unrecognized_total",
                "States reported outside the exporter's codebook",
            ),
            &["name"],
        )
        .expect("build unrecognized state counter");

        let node_count = IntGauge::new(
            "icon_preps_node_count",
            "Number of P-Rep nodes in the directory list",
        )
        .expect("build node count gauge");

        let highest_block = IntGauge::new(
            "icon_highest_block",
            "Number of the highest block in chain as seen by the reference node",
        )
        .expect("build highest block gauge");

        let total_tx = IntGauge::new(
            "icon_total_tx",
            "Total number of transactions as seen by the reference node",
        )
        .expect("build total tx gauge");

        let reference_block_time = GaugeVec::new(
            Opts::new(
                "icon_node_reference_block_time_seconds",
                "Estimated seconds per block at the reference node",
            ),
            &["name", "address"],
        )
        .expect("build reference block time gauge");

        let directory_requests = IntCounter::new(
            "icon_directory_requests_total",
            "Directory (P-Rep list) fetch attempts",
        )
        .expect("build directory request counter");

        let directory_errors = IntCounter::new(
            "icon_directory_errors_total",
            "Failed directory (P-Rep list) fetches",
        )
        .expect("build directory error counter");

        let cycles = IntCounter::new(
            "icon_exporter_cycles_total",
            "Completed polling cycles",
        )
        .expect("build cycle counter");

        let uptime = Gauge::new("icon_exporter_uptime_seconds", "Exporter uptime in seconds")
            .expect("build uptime gauge");

        registry
            .register(Box::new(node_block_height.clone()))
            .expect("register node_block_height");
        registry
            .register(Box::new(node_rank.clone()))
            .expect("register node_rank");
        registry
            .register(Box::new(node_state.clone()))
            .expect("register node_state");
        registry
            .register(Box::new(node_block_time.clone()))
            .expect("register node_block_time");
        registry
            .register(Box::new(node_poll.clone()))
            .expect("register node_poll");
        registry
            .register(Box::new(state_unrecognized.clone()))
            .expect("register state_unrecognized");
        registry
            .register(Box::new(node_count.clone()))
            .expect("register node_count");
        registry
            .register(Box::new(highest_block.clone()))
            .expect("register highest_block");
        registry
            .register(Box::new(total_tx.clone()))
            .expect("register total_tx");
        registry
            .register(Box::new(reference_block_time.clone()))
            .expect("register reference_block_time");
        registry
            .register(Box::new(directory_requests.clone()))
            .expect("register directory_requests");
        registry
            .register(Box::new(directory_errors.clone()))
            .expect("register directory_errors");
        registry
            .register(Box::new(cycles.clone()))
            .expect("register cycles");
        registry
            .register(Box::new(uptime.clone()))
            .expect("register uptime");

        Self {
            registry,
            start_time: Instant::now(),
            node_block_height,
            node_rank,
            node_state,
            node_block_time,
            node_poll,
            state_unrecognized,
            node_count,
            highest_block,
            total_tx,
            reference_block_time,
            directory_requests,
            directory_errors,
            cycles,
            uptime,
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn set_node_block_height(&self, name: &str, height: u64) {
        self.node_block_height
            .with_label_values(&[name])
            .set(height as i64);
    }

    pub fn set_node_rank(&self, name: &str, address: &str, rank: usize) {
        self.node_rank
            .with_label_values(&[name, address])
            .set(rank as i64);
    }

    pub fn set_node_state(&self, name: &str, code: u8) {
        self.node_state
            .with_label_values(&[name])
            .set(code as i64);
    }

    pub fn set_node_block_time(&self, name: &str, seconds: f64) {
        self.node_block_time
            .with_label_values(&[name])
            .set(seconds);
    }

    pub fn inc_node_poll(&self, name: &str, outcome: &str) {
        self.node_poll.with_label_values(&[name, outcome]).inc();
    }

    pub fn inc_state_unrecognized(&self, name: &str) {
        self.state_unrecognized.with_label_values(&[name]).inc();
    }

    pub fn set_node_count(&self, count: usize) {
        self.node_count.set(count as i64);
    }

    pub fn set_highest_block(&self, height: u64) {
        self.highest_block.set(height as i64);
    }

    pub fn set_total_tx(&self, total: u64) {
        self.total_tx.set(total as i64);
    }

    pub fn set_reference_block_time(&self, name: &str, address: &str, seconds: f64) {
        self.reference_block_time
            .with_label_values(&[name, address])
            .set(seconds);
    }

    pub fn inc_directory_request(&self) {
        self.directory_requests.inc();
    }

    pub fn inc_directory_error(&self) {
        self.directory_errors.inc();
    }

    pub fn inc_cycle(&self) {
        self.cycles.inc();
    }

    /// Render all registered series in Prometheus text format
    pub fn gather(&self) -> anyhow::Result<String> {
        self.uptime.set(self.start_time.elapsed().as_secs_f64());

        let metric_families = self.registry.gather();
        let mut buffer = Vec::with_capacity(8192);
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| anyhow::anyhow!("failed to encode metrics: {e}"))?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let metrics = ExporterMetrics::new();

        metrics.inc_node_poll("alpha", "ok");
        metrics.inc_node_poll("alpha", "ok");
        metrics.inc_node_poll("alpha", "error");
        metrics.inc_directory_request();

        let output = metrics.gather().unwrap();
        assert!(output.contains("icon_node_poll_total{name=\"alpha\",outcome=\"ok\"} 2"));
        assert!(output.contains("icon_node_poll_total{name=\"alpha\",outcome=\"error\"} 1"));
        assert!(output.contains("icon_directory_requests_total 1"));
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = ExporterMetrics::new();

        metrics.set_node_block_height("alpha", 42_000_000);
        metrics.set_node_rank("alpha", "hx01", 1);
        metrics.set_highest_block(42_000_000);
        metrics.set_total_tx(90_000_000);
        metrics.set_node_block_time("alpha", 2.0);
        metrics.set_node_state("alpha", 1);

        let output = metrics.gather().unwrap();
        assert!(output.contains("icon_preps_block_height{name=\"alpha\"} 42000000"));
        assert!(output.contains("icon_preps_node_rank{address=\"hx01\",name=\"alpha\"} 1"));
        assert!(output.contains("icon_highest_block 42000000"));
        assert!(output.contains("icon_total_tx 90000000"));
        assert!(output.contains("icon_preps_block_time_seconds{name=\"alpha\"} 2"));
        assert!(output.contains("icon_preps_node_state{name=\"alpha\"} 1"));
    }

    #[test]
    fn test_independent_registries() {
        // two instances must not collide (no global registry)
        let a = ExporterMetrics::new();
        let b = ExporterMetrics::new();

        a.set_highest_block(10);
        b.set_highest_block(20);

        assert!(a.gather().unwrap().contains("icon_highest_block 10"));
        assert!(b.gather().unwrap().contains("icon_highest_block 20"));
    }
}
