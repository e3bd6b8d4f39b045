//! Failure classification and JSON-RPC error shaping.
//!
//! Three outcome classes, mapped deterministically:
//! - protocol error (`RpcError`): message/code/data verbatim, HTTP 200, `client_error`
//! - unexpected error: message only, HTTP 500, `server_error`
//! - handler panic: fixed `"Unknown error"`, HTTP 500, `server_error`

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use bundler_rpc_core::protocol::envelope::{bare_error_response, error_response};
use bundler_rpc_core::protocol::RequestId;
use bundler_rpc_core::RpcError;

use super::handler::{BoxError, HandlerError};
use crate::transport::reply::RpcStatus;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Panic payload caught at the dispatch boundary.
#[derive(Debug, Error)]
#[error("handler panicked: {0}")]
pub struct PanicError(pub String);

/// Anything that ends a request without a result.
#[derive(Debug)]
pub enum Failure {
    Rpc(RpcError),
    Internal(BoxError),
    Panic(PanicError),
}

impl Failure {
    /// The error to hand to the reporter, if this failure is unexpected.
    pub fn unexpected(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let err: &(dyn std::error::Error + 'static) = match self {
            Failure::Rpc(_) => return None,
            Failure::Internal(e) => &**e,
            Failure::Panic(p) => p,
        };
        Some(err)
    }
}

impl From<RpcError> for Failure {
    fn from(e: RpcError) -> Self {
        Failure::Rpc(e)
    }
}

impl From<HandlerError> for Failure {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Rpc(e) => Failure::Rpc(e),
            HandlerError::Internal(e) => Failure::Internal(e),
        }
    }
}

/// Body of the `error` member.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// `{message, code, data?}`, sent verbatim.
    Rpc(RpcError),
    /// `{message}` only.
    Message(String),
}

impl ErrorBody {
    pub fn message(&self) -> &str {
        match self {
            ErrorBody::Rpc(e) => &e.message,
            ErrorBody::Message(m) => m,
        }
    }
}

/// Serializable outcome of a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedError {
    pub body: ErrorBody,
    pub http_status: StatusCode,
    pub rpc_status: RpcStatus,
}

impl MappedError {
    /// Full JSON-RPC error envelope for `id`.
    pub fn payload(&self, id: &RequestId) -> Value {
        match &self.body {
            ErrorBody::Rpc(e) => error_response(id, e),
            ErrorBody::Message(m) => bare_error_response(id, m),
        }
    }
}

pub fn map_failure(failure: &Failure) -> MappedError {
    match failure {
        Failure::Rpc(e) => MappedError {
            body: ErrorBody::Rpc(e.clone()),
            http_status: StatusCode::OK,
            rpc_status: RpcStatus::ClientError,
        },
        Failure::Internal(e) => MappedError {
            body: ErrorBody::Message(e.to_string()),
            http_status: StatusCode::INTERNAL_SERVER_ERROR,
            rpc_status: RpcStatus::ServerError,
        },
        Failure::Panic(_) => MappedError {
            body: ErrorBody::Message(UNKNOWN_ERROR.to_string()),
            http_status: StatusCode::INTERNAL_SERVER_ERROR,
            rpc_status: RpcStatus::ServerError,
        },
    }
}
