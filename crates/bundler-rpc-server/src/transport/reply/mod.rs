//! Reply adapters: one send contract over two transports.
//!
//! - `HttpReply`: buffers one HTTP response, turned into an axum `Response`
//!   by the route handler once the pipeline returns.
//! - `WsReply`: writes one text frame to the originating socket and leaves
//!   the connection open for further frames.
//!
//! Every payload goes through `bundler_rpc_core::wire::encode`, the single
//! place JSON becomes wire bytes. A second `send` on the same adapter is
//! rejected with `ReplyError::AlreadySent`.

pub mod http;
pub mod ws;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use bundler_rpc_core::protocol::BundlerMethod;

pub use http::{HttpReply, RpcObservation};
pub use ws::WsReply;

/// RPC-level outcome label, independent of transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcStatus {
    Success,
    ClientError,
    ServerError,
}

impl RpcStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RpcStatus::Success => "success",
            RpcStatus::ClientError => "client_error",
            RpcStatus::ServerError => "server_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply already sent")]
    AlreadySent,
    #[error("reply encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("connection closed before reply was written")]
    ChannelClosed,
}

/// Transport-neutral reply channel for exactly one logical request.
#[async_trait]
pub trait RpcReply: Send {
    fn set_rpc_status(&mut self, status: RpcStatus) -> &mut dyn RpcReply;

    /// Transport status; socket frames have none, so WebSocket ignores it.
    fn status(&mut self, status: StatusCode) -> &mut dyn RpcReply;

    /// Resolved RPC method, for observability labels.
    fn set_rpc_method(&mut self, _method: BundlerMethod) {}

    async fn send(&mut self, payload: &Value) -> Result<(), ReplyError>;
}
