//! Core types for network sampling
//!
//! A polling cycle turns the directory's ranked [`NodeDescriptor`] list into
//! one [`SnapshotSet`] of per-node [`Sample`]s. Snapshots are immutable once
//! the cycle closes; derived metrics are recomputed from them every cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::UnknownStateError;

/// Block number reported by a node
pub type BlockNumber = u64;

/// Transaction count reported by a node
pub type TxCount = u64;

// =============================================================================
// NODE DESCRIPTORS (directory service records)
// =============================================================================

/// A registered P-Rep node as listed by the directory service
///
/// The list is replaced wholesale on each refresh; rank is positional in
/// directory order (stake order) and may map to a different node identity
/// after a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Node display name
    pub name: String,

    /// Operator wallet address (hx...)
    pub address: String,

    /// Derived status URL (http://<p2p host>:9000/api/v1/status/peer)
    pub api_endpoint: String,

    /// 1-based stake rank
    pub rank: usize,
}

// =============================================================================
// SAMPLES & SNAPSHOTS
// =============================================================================

/// One successful status reading from a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Status endpoint this sample was read from
    pub endpoint: String,

    /// Reported chain height
    pub block_height: BlockNumber,

    /// Raw liveness state string as reported
    pub state: String,

    /// Reported ledger-wide transaction count
    pub total_tx: TxCount,

    /// When the sample was captured
    pub captured_at: DateTime<Utc>,
}

/// The samples gathered in one polling cycle, keyed by endpoint
///
/// Covers exactly the nodes that answered; unreachable or erroring nodes
/// have no entry. May legitimately be empty.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    samples: HashMap<String, Sample>,
}

impl SnapshotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample, keyed by its endpoint
    pub fn insert(&mut self, sample: Sample) {
        self.samples.insert(sample.endpoint.clone(), sample);
    }

    /// Look up the sample for an endpoint, if that node answered this cycle
    pub fn get(&self, endpoint: &str) -> Option<&Sample> {
        self.samples.get(endpoint)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// =============================================================================
// CONSENSUS STATE CODEBOOK
// =============================================================================

/// Closed ordinal codebook for the node liveness state
///
/// Nodes report their channel state as free text; metric export needs a
/// fixed numeric encoding. Strings outside this set are a reporting error
/// ([`UnknownStateError`]), never silently coerced — operators rely on the
/// codebook being exhaustive for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusState {
    /// Producing blocks as the current leader (code 0)
    BlockGenerate,

    /// Voting on proposed blocks (code 1)
    Vote,

    /// Watching the chain without consensus participation (code 2)
    Watch,

    /// Subscribing to the network (code 3)
    SubscribeNetwork,

    /// Catching up on missed blocks (code 4)
    BlockSync,

    /// Evaluating network peers (code 5)
    EvaluateNetwork,

    /// Starting up (code 6)
    InitComponents,
}

impl ConsensusState {
    /// Parse a reported state string against the codebook
    pub fn parse(state: &str) -> Result<Self, UnknownStateError> {
        match state {
            "BlockGenerate" => Ok(ConsensusState::BlockGenerate),
            "Vote" => Ok(ConsensusState::Vote),
            "Watch" => Ok(ConsensusState::Watch),
            "SubscribeNetwork" => Ok(ConsensusState::SubscribeNetwork),
            "BlockSync" => Ok(ConsensusState::BlockSync),
            "EvaluateNetwork" => Ok(ConsensusState::EvaluateNetwork),
            "InitComponents" => Ok(ConsensusState::InitComponents),
            other => Err(UnknownStateError(other.to_string())),
        }
    }

    /// Ordinal code exported as the state gauge value
    pub fn code(&self) -> u8 {
        match self {
            ConsensusState::BlockGenerate => 0,
            ConsensusState::Vote => 1,
            ConsensusState::Watch => 2,
            ConsensusState::SubscribeNetwork => 3,
            ConsensusState::BlockSync => 4,
            ConsensusState::EvaluateNetwork => 5,
            ConsensusState::InitComponents => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(endpoint: &str, height: BlockNumber) -> Sample {
        Sample {
            endpoint: endpoint.to_string(),
            block_height: height,
            state: "Vote".to_string(),
            total_tx: 0,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_set_lookup() {
        let mut set = SnapshotSet::new();
        assert!(set.is_empty());

        set.insert(sample("http://1.2.3.4:9000/api/v1/status/peer", 100));
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get("http://1.2.3.4:9000/api/v1/status/peer")
                .map(|s| s.block_height),
            Some(100)
        );
        assert!(set.get("http://5.6.7.8:9000/api/v1/status/peer").is_none());
    }

    #[test]
    fn test_snapshot_set_last_insert_wins() {
        let mut set = SnapshotSet::new();
        set.insert(sample("http://1.2.3.4:9000/api/v1/status/peer", 100));
        set.insert(sample("http://1.2.3.4:9000/api/v1/status/peer", 101));

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get("http://1.2.3.4:9000/api/v1/status/peer")
                .map(|s| s.block_height),
            Some(101)
        );
    }

    #[test]
    fn test_state_codebook() {
        assert_eq!(ConsensusState::parse("BlockGenerate").unwrap().code(), 0);
        assert_eq!(ConsensusState::parse("Vote").unwrap().code(), 1);
        assert_eq!(ConsensusState::parse("Watch").unwrap().code(), 2);
        assert_eq!(ConsensusState::parse("SubscribeNetwork").unwrap().code(), 3);
        assert_eq!(ConsensusState::parse("BlockSync").unwrap().code(), 4);
        assert_eq!(ConsensusState::parse("EvaluateNetwork").unwrap().code(), 5);
        assert_eq!(ConsensusState::parse("InitComponents").unwrap().code(), 6);
    }

    #[test]
    fn test_unrecognized_state_is_an_error() {
        let err = ConsensusState::parse("Unknown").unwrap_err();
        assert_eq!(err, UnknownStateError("Unknown".to_string()));

        // case matters, the codebook is exact
        assert!(ConsensusState::parse("vote").is_err());
        assert!(ConsensusState::parse("").is_err());
    }
}
