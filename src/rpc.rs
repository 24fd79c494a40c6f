//! HTTP clients for the directory service and node status endpoints
//!
//! Two collaborators live here: the JSON-RPC directory call that produces the
//! ranked P-Rep list (`getPReps`), and the plain GET against each node's
//! status endpoint. Directory failures are fatal for the cycle's refresh;
//! per-node failures are data, handled by the collector.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{DirectoryError, PeerError};
use crate::types::NodeDescriptor;

/// Port and path every node serves its status document on
const STATUS_PORT: u16 = 9000;
const STATUS_PATH: &str = "/api/v1/status/peer";

/// Ranking range requested from the directory (1 to 100, hex-encoded)
const START_RANKING: &str = "0x1";
const END_RANKING: &str = "0x64";

/// JSON-RPC request
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: &'static str,
    params: serde_json::Value,
    id: u64,
}

/// JSON-RPC response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[allow(dead_code)]
    code: i64,
    message: String,
}

/// `getPReps` result payload
#[derive(Debug, Deserialize)]
struct PrepListResult {
    preps: Vec<PrepRecord>,
}

/// One directory record; only the fields the exporter needs
#[derive(Debug, Deserialize)]
struct PrepRecord {
    name: String,
    address: String,
    #[serde(rename = "p2pEndpoint")]
    p2p_endpoint: String,
}

/// Status document served by a node
///
/// Nodes report more fields than these; unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PeerStatus {
    pub block_height: u64,
    pub total_tx: u64,
    pub state: String,
}

/// Client for the directory service and node status endpoints
pub struct RpcClient {
    directory_url: String,
    client: Client,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Create a new client; `directory_timeout` bounds the refresh call
    pub fn new(directory_url: &str, directory_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(directory_timeout).build()?;

        Ok(Self {
            directory_url: directory_url.to_string(),
            client,
            request_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Fetch the ranked P-Rep list from the directory service
    ///
    /// Rank is positional: the directory returns nodes in stake order and the
    /// first record gets rank 1.
    pub async fn get_preps(&self) -> Result<Vec<NodeDescriptor>, DirectoryError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: "icx_call",
            params: serde_json::json!({
                "to": "cx0000000000000000000000000000000000000000",
                "dataType": "call",
                "data": {
                    "method": "getPReps",
                    "params": {
                        "startRanking": START_RANKING,
                        "endRanking": END_RANKING,
                    }
                }
            }),
            id: self.next_id(),
        };

        let response = self
            .client
            .post(&self.directory_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DirectoryError::BadStatus(response.status()));
        }

        let body = response.text().await?;
        let parsed: JsonRpcResponse<PrepListResult> = serde_json::from_str(&body)
            .map_err(|e| DirectoryError::Malformed(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(DirectoryError::Rpc(error.message));
        }

        let result = parsed
            .result
            .ok_or_else(|| DirectoryError::Malformed("missing result".to_string()))?;

        Ok(result
            .preps
            .into_iter()
            .enumerate()
            .map(|(i, prep)| NodeDescriptor {
                api_endpoint: status_endpoint(&prep.p2p_endpoint),
                name: prep.name,
                address: prep.address,
                rank: i + 1,
            })
            .collect())
    }

    /// Poll one node's status endpoint with a bounded timeout
    pub async fn get_peer_status(
        &self,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<PeerStatus, PeerError> {
        let response = self.client.get(endpoint).timeout(timeout).send().await?;

        if !response.status().is_success() {
            return Err(PeerError::BadStatus(response.status()));
        }

        let body = response.text().await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| PeerError::Malformed(e.to_string()))?;

        // An explicit error field counts as a failed poll even on HTTP 200
        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            return Err(PeerError::Reported(error.to_string()));
        }

        serde_json::from_value(value).map_err(|e| PeerError::Malformed(e.to_string()))
    }
}

/// Derive a node's status URL from its directory p2p endpoint
///
/// The directory lists `host:port` p2p endpoints; the status document is
/// always served on port 9000 of the same host.
pub fn status_endpoint(p2p_endpoint: &str) -> String {
    let host = p2p_endpoint.split(':').next().unwrap_or(p2p_endpoint);
    format!("http://{}:{}{}", host, STATUS_PORT, STATUS_PATH)
}
