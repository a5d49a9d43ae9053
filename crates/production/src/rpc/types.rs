//! Request and response bodies for the RPC API.

use pbft_types::Block;
use serde::{Deserialize, Serialize};

/// Response for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests.
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Response for `GET /ready`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    /// "ready" or "not_ready".
    pub status: String,
    /// Machine-readable readiness.
    pub ready: bool,
}

/// Request for `POST /api/v1/blocks`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitBlockRequest {
    /// Opaque payload for the proposed block.
    pub data: String,
}

/// Response for `POST /api/v1/blocks`.
///
/// `accepted` means consensus was initiated, not that the block committed.
/// Clients poll `GET /api/v1/blockchain` to observe the outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitBlockResponse {
    /// Whether the submission entered consensus.
    pub accepted: bool,
    /// Height the block will occupy if it commits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    /// On NOT_PRIMARY rejections, where to resubmit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_id: Option<String>,
    /// Rejection reason, when not accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON rendering of a committed block. Digests are lowercase hex.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockJson {
    /// Position in the chain.
    pub height: u64,
    /// Parent digest; all zeros for genesis.
    pub previous_hash: String,
    /// This block's digest.
    pub block_hash: String,
    /// Producer's wall clock in milliseconds.
    pub timestamp: u64,
    /// Payload.
    pub data: String,
    /// View the block was proposed under.
    pub view: u64,
    /// Slot the block was proposed at.
    pub sequence: u64,
}

impl From<&Block> for BlockJson {
    fn from(block: &Block) -> Self {
        Self {
            height: block.height.0,
            previous_hash: block.previous_hash.to_hex(),
            block_hash: block.block_hash.to_hex(),
            timestamp: block.timestamp,
            data: block.data.clone(),
            view: block.view.0,
            sequence: block.sequence.0,
        }
    }
}

/// Response for `GET /api/v1/blockchain`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockchainResponse {
    /// All committed blocks, genesis first.
    pub blocks: Vec<BlockJson>,
    /// Height of the tip.
    pub chain_height: u64,
}

/// Response for `GET /api/v1/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeStatusResponse {
    /// This node's id.
    pub node_id: String,
    /// Current view.
    pub view: u64,
    /// Whether this node is the primary.
    pub is_primary: bool,
    /// Height of the committed chain tip.
    pub chain_height: u64,
    /// Current fault-injection mode.
    pub malicious_mode: String,
    /// Seconds since the RPC server started.
    pub uptime_secs: u64,
}

/// Request for `POST /api/v1/malicious`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetMaliciousRequest {
    /// One of "honest", "silent", "wrong_hash".
    pub mode: String,
}

/// Response for `POST /api/v1/malicious`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetMaliciousResponse {
    /// Whether the toggle was applied.
    pub ok: bool,
    /// The mode now in effect (echo of the request on success).
    pub mode: String,
    /// Rejection reason, when not ok.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
