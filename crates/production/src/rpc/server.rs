//! RPC server implementation.

use super::routes::create_router;
use super::state::RpcState;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Errors from the RPC server.
#[derive(Debug, Error)]
pub enum RpcServerError {
    /// Binding the listen address failed.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),
}

/// Configuration for the RPC server.
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Handle for controlling a running RPC server.
pub struct RpcServerHandle {
    task: JoinHandle<()>,
    ready_flag: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl RpcServerHandle {
    /// Mark the node as ready (for the readiness probe).
    pub fn set_ready(&self, ready: bool) {
        self.ready_flag.store(ready, Ordering::SeqCst);
    }

    /// The bound address (useful with port 0 in tests).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Abort the server task.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the server to finish.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.task.await
    }
}

/// RPC server for a replica node.
pub struct RpcServer {
    config: RpcServerConfig,
    state: RpcState,
}

impl RpcServer {
    /// Create a server over pre-built shared state.
    ///
    /// The state is shared with the node loop, which keeps the snapshots
    /// inside it fresh.
    pub fn new(config: RpcServerConfig, state: RpcState) -> Self {
        Self { config, state }
    }

    /// Start serving and return a control handle.
    pub async fn start(self) -> Result<RpcServerHandle, RpcServerError> {
        let ready_flag = self.state.ready.clone();
        let router = create_router(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "RPC server listening");

        let task = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                error!(%err, "RPC server error");
            }
        });

        Ok(RpcServerHandle {
            task,
            ready_flag,
            local_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::NodeStatusState;
    use pbft_types::Block;
    use std::time::Instant;
    use tokio::sync::{mpsc, RwLock};

    fn test_state() -> (RpcState, mpsc::UnboundedReceiver<pbft_core::Event>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = RpcState {
            ready: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(NodeStatusState {
                node_id: "node1".to_string(),
                view: 0,
                is_primary: true,
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

    #[test]
    fn test_default_config() {
        let config = RpcServerConfig::default();
        assert_eq!(config.listen_addr.port(), 8080);
    }

    #[tokio::test]
    async fn test_start_and_ready_flag() {
        let config = RpcServerConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
        };
        let (state, _event_rx) = test_state();
        let ready = state.ready.clone();

        let handle = RpcServer::new(config, state).start().await.unwrap();
        assert!(!ready.load(Ordering::SeqCst));
        handle.set_ready(true);
        assert!(ready.load(Ordering::SeqCst));
        assert_ne!(handle.local_addr().port(), 0);
        handle.abort();
    }
}
