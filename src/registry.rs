//! Node Descriptor Registry
//!
//! Holds the current ranked P-Rep list. The list is replaced wholesale at a
//! configurable cadence from the directory service; there is no partial
//! update. Only the polling loop writes here.

use crate::types::NodeDescriptor;

/// Registry of known nodes with refresh bookkeeping
pub struct NodeRegistry {
    /// Ranked descriptor list, directory order
    nodes: Vec<NodeDescriptor>,

    /// Cycles between directory refreshes
    refresh_cycles: u64,

    /// Completed cycles since the last successful refresh
    cycles_since_refresh: u64,
}

impl NodeRegistry {
    pub fn new(refresh_cycles: u64) -> Self {
        Self {
            nodes: Vec::new(),
            refresh_cycles,
            cycles_since_refresh: 0,
        }
    }

    /// Current descriptors in rank order
    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the next cycle should fetch a fresh list
    ///
    /// True until the first successful refresh, then again once the cadence
    /// has elapsed. A failed refresh leaves the counter alone, so the next
    /// cycle retries immediately.
    pub fn refresh_due(&self) -> bool {
        self.nodes.is_empty() || self.cycles_since_refresh >= self.refresh_cycles
    }

    /// Replace the list wholesale after a successful directory fetch
    pub fn replace(&mut self, nodes: Vec<NodeDescriptor>) {
        self.nodes = nodes;
        self.cycles_since_refresh = 0;
    }

    /// Record one completed polling cycle
    pub fn tick(&mut self) {
        self.cycles_since_refresh += 1;
    }

    /// Find the descriptor that owns a status endpoint
    pub fn find_by_endpoint(&self, endpoint: &str) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.api_endpoint == endpoint)
    }
}
