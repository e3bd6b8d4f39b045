//! Collaborator seams: the method handler and the error reporter.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use bundler_rpc_core::protocol::{BundlerRequest, RequestId};
use bundler_rpc_core::{ApiVersion, RpcError};

/// Boxed error for unexpected handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure returned by a method handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Protocol error: sent to the caller verbatim with its code.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// Anything else: caller sees only the message, detail goes to the reporter.
    #[error(transparent)]
    Internal(BoxError),
}

impl HandlerError {
    pub fn internal(e: impl Into<BoxError>) -> Self {
        HandlerError::Internal(e.into())
    }
}

/// Bundler business logic lives behind this trait.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn handle_method(
        &self,
        request: &BundlerRequest,
        version: ApiVersion,
    ) -> Result<Value, HandlerError>;
}

/// Context handed to the error reporter for one unexpected failure.
#[derive(Debug)]
pub struct ErrorReport<'a> {
    pub request_id: &'a RequestId,
    pub rpc_method: Option<&'a str>,
    pub error: &'a (dyn std::error::Error + 'static),
}

/// External error-tracking sink, called once per unexpected failure.
pub trait ErrorReporter: Send + Sync {
    fn capture(&self, report: &ErrorReport<'_>);
}

/// Default reporter: error-level log with the full source chain.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn capture(&self, report: &ErrorReport<'_>) {
        let mut chain = report.error.to_string();
        let mut source = report.error.source();
        while let Some(s) = source {
            chain.push_str(": ");
            chain.push_str(&s.to_string());
            source = s.source();
        }
        tracing::error!(
            request_id = %report.request_id,
            rpc_method = report.rpc_method.unwrap_or("none"),
            error = %chain,
            "captured unexpected error"
        );
    }
}
