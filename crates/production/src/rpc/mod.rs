//! JSON RPC facade for clients and operators.
//!
//! Peers never speak HTTP — consensus traffic rides the TCP transport.
//! This surface carries client submissions, chain and status reads, and the
//! fault-injection toggle used by the BFT test harness.

mod handlers;
mod routes;
mod server;
mod state;
mod types;

pub use routes::create_router;
pub use server::{RpcServer, RpcServerConfig, RpcServerError, RpcServerHandle};
pub use state::{NodeStatusState, RpcState};
pub use types::{
    BlockJson, BlockchainResponse, HealthResponse, NodeStatusResponse, ReadyResponse,
    SetMaliciousRequest, SetMaliciousResponse, SubmitBlockRequest, SubmitBlockResponse,
};
