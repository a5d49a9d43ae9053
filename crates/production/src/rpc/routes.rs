//! Route configuration for the RPC API.

use super::handlers::*;
use super::state::RpcState;
use axum::{
    routing::{get, post},
    Router,
};

/// Create the full router with all RPC routes.
pub fn create_router(state: RpcState) -> Router {
    Router::new()
        // Health & readiness probes (no prefix)
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        // API v1 routes
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

/// Create the `/api/v1` router.
fn api_v1_routes() -> Router<RpcState> {
    Router::new()
        .route("/blocks", post(submit_block_handler))
        .route("/blockchain", get(blockchain_handler))
        .route("/status", get(status_handler))
        .route("/malicious", post(malicious_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{
        BlockchainResponse, NodeStatusResponse, NodeStatusState, SetMaliciousResponse,
        SubmitBlockResponse,
    };
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use pbft_core::Event;
    use pbft_types::Block;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::sync::{mpsc, RwLock};
    use tower::ServiceExt;

    fn test_state(is_primary: bool) -> (RpcState, mpsc::UnboundedReceiver<Event>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = RpcState {
            ready: Arc::new(AtomicBool::new(true)),
            status: Arc::new(RwLock::new(NodeStatusState {
                node_id: if is_primary { "node1" } else { "node2" }.to_string(),
                view: 0,
                is_primary,
                primary_id: "node1".to_string(),
                chain_height: 0,
                malicious_mode: "honest".to_string(),
            })),
            chain: Arc::new(RwLock::new(vec![Block::genesis()])),
            event_tx,
            start_time: Instant::now(),
        };
        (state, event_rx)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _rx) = test_state(true);
        let response = create_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_reports_identity() {
        let (state, _rx) = test_state(true);
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let status: NodeStatusResponse = body_json(response).await;
        assert_eq!(status.node_id, "node1");
        assert!(status.is_primary);
        assert_eq!(status.malicious_mode, "honest");
    }

    #[tokio::test]
    async fn test_blockchain_starts_at_genesis() {
        let (state, _rx) = test_state(true);
        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/blockchain")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let chain: BlockchainResponse = body_json(response).await;
        assert_eq!(chain.blocks.len(), 1);
        assert_eq!(chain.chain_height, 0);
        assert_eq!(chain.blocks[0].data, "genesis");
        assert_eq!(chain.blocks[0].previous_hash, "0".repeat(64));
    }

    #[tokio::test]
    async fn test_submit_on_primary_queues_event() {
        let (state, mut rx) = test_state(true);
        let response = create_router(state)
            .oneshot(post_json("/api/v1/blocks", r#"{"data":"hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body: SubmitBlockResponse = body_json(response).await;
        assert!(body.accepted);
        assert_eq!(body.block_height, Some(1));

        match rx.try_recv().unwrap() {
            Event::ClientSubmit { data } => assert_eq!(data, "hello"),
            other => panic!("unexpected event {}", other.type_name()),
        }
    }

    #[tokio::test]
    async fn test_submit_on_replica_names_the_primary() {
        let (state, mut rx) = test_state(false);
        let response = create_router(state)
            .oneshot(post_json("/api/v1/blocks", r#"{"data":"hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::MISDIRECTED_REQUEST);

        let body: SubmitBlockResponse = body_json(response).await;
        assert!(!body.accepted);
        assert_eq!(body.error.as_deref(), Some("not_primary"));
        assert_eq!(body.primary_id.as_deref(), Some("node1"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_payload_rejected() {
        let (state, mut rx) = test_state(true);
        let response = create_router(state)
            .oneshot(post_json("/api/v1/blocks", r#"{"data":""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malicious_toggle_roundtrip() {
        let (state, mut rx) = test_state(true);
        let response = create_router(state)
            .oneshot(post_json("/api/v1/malicious", r#"{"mode":"wrong_hash"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: SetMaliciousResponse = body_json(response).await;
        assert!(body.ok);
        assert_eq!(body.mode, "wrong_hash");
        assert!(matches!(
            rx.try_recv().unwrap(),
            Event::SetMaliciousMode { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_malicious_mode_rejected() {
        let (state, mut rx) = test_state(true);
        let response = create_router(state)
            .oneshot(post_json("/api/v1/malicious", r#"{"mode":"chaotic"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }
}
