//! HTTP request handlers for the RPC API.

use super::state::RpcState;
use super::types::*;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use pbft_core::{Event, MaliciousMode};
use std::sync::atomic::Ordering;
use tracing::info;

// ═══════════════════════════════════════════════════════════════════════════
// Health & Readiness Handlers
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `GET /health` - liveness probe.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Handler for `GET /ready` - readiness probe.
pub async fn ready_handler(State(state): State<RpcState>) -> impl IntoResponse {
    if state.ready.load(Ordering::SeqCst) {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready".to_string(),
                ready: true,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "not_ready".to_string(),
                ready: false,
            }),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Client Handlers
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `POST /api/v1/blocks` - client block submission.
///
/// Only the primary initiates consensus; a replica answers NOT_PRIMARY and
/// names the primary so the client can resubmit there. On the primary the
/// submission is queued and 202 returned immediately — the client observes
/// the outcome by polling `GET /api/v1/blockchain`.
pub async fn submit_block_handler(
    State(state): State<RpcState>,
    Json(request): Json<SubmitBlockRequest>,
) -> impl IntoResponse {
    let status = state.status.read().await;

    if !status.is_primary {
        return (
            StatusCode::MISDIRECTED_REQUEST,
            Json(SubmitBlockResponse {
                accepted: false,
                block_height: None,
                primary_id: Some(status.primary_id.clone()),
                error: Some("not_primary".to_string()),
            }),
        );
    }

    if request.data.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(SubmitBlockResponse {
                accepted: false,
                block_height: None,
                primary_id: None,
                error: Some("empty payload".to_string()),
            }),
        );
    }

    // Height the block lands at if it is the only proposal in flight.
    let block_height = status.chain_height + 1;
    drop(status);

    if state
        .event_tx
        .send(Event::ClientSubmit { data: request.data })
        .is_err()
    {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SubmitBlockResponse {
                accepted: false,
                block_height: None,
                primary_id: None,
                error: Some("node is shutting down".to_string()),
            }),
        );
    }

    (
        StatusCode::ACCEPTED,
        Json(SubmitBlockResponse {
            accepted: true,
            block_height: Some(block_height),
            primary_id: None,
            error: None,
        }),
    )
}

/// Handler for `GET /api/v1/blockchain` - the full committed chain.
pub async fn blockchain_handler(State(state): State<RpcState>) -> impl IntoResponse {
    let chain = state.chain.read().await;
    let blocks: Vec<BlockJson> = chain.iter().map(BlockJson::from).collect();
    let chain_height = blocks.last().map_or(0, |b| b.height);

    Json(BlockchainResponse {
        blocks,
        chain_height,
    })
}

/// Handler for `GET /api/v1/status` - node status.
pub async fn status_handler(State(state): State<RpcState>) -> impl IntoResponse {
    let status = state.status.read().await;

    Json(NodeStatusResponse {
        node_id: status.node_id.clone(),
        view: status.view,
        is_primary: status.is_primary,
        chain_height: status.chain_height,
        malicious_mode: status.malicious_mode.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Fault-Injection Handler
// ═══════════════════════════════════════════════════════════════════════════

/// Handler for `POST /api/v1/malicious` - toggle the behavior mode.
pub async fn malicious_handler(
    State(state): State<RpcState>,
    Json(request): Json<SetMaliciousRequest>,
) -> impl IntoResponse {
    let mode: MaliciousMode = match request.mode.parse() {
        Ok(mode) => mode,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SetMaliciousResponse {
                    ok: false,
                    mode: request.mode,
                    error: Some(err.to_string()),
                }),
            );
        }
    };

    if state
        .event_tx
        .send(Event::SetMaliciousMode { mode })
        .is_err()
    {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SetMaliciousResponse {
                ok: false,
                mode: request.mode,
                error: Some("node is shutting down".to_string()),
            }),
        );
    }

    info!(mode = %mode, "malicious mode toggle queued");
    (
        StatusCode::OK,
        Json(SetMaliciousResponse {
            ok: true,
            mode: mode.as_str().to_string(),
            error: None,
        }),
    )
}
