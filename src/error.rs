//! Error taxonomy for the exporter
//!
//! Failures fall into three buckets with different blast radii:
//!
//! - [`DirectoryError`]: the P-Rep directory could not be fetched. Fatal for
//!   the current cycle (no collection, no window push, no metrics), the loop
//!   resumes on the next tick.
//! - [`PeerError`]: a single node's status poll failed. Recovered locally,
//!   the node is simply absent from the cycle's snapshot.
//! - [`UnknownStateError`]: a node reported a liveness state outside the
//!   exporter's codebook. Reported through its own counter so operators can
//!   detect protocol drift.

use thiserror::Error;

/// Failure to fetch the ranked P-Rep list from the directory service.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("directory returned HTTP {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("directory rpc error: {0}")]
    Rpc(String),

    #[error("malformed directory response: {0}")]
    Malformed(String),
}

/// Failure to poll a single node's status endpoint.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("status request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node returned HTTP {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("node reported an error: {0}")]
    Reported(String),

    #[error("malformed status body: {0}")]
    Malformed(String),
}

/// A liveness state string that is not in the exporter's codebook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized node state {0:?}")]
pub struct UnknownStateError(pub String);
