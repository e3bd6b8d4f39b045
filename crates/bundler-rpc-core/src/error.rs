//! Shared error types across bundler-rpc crates.

use serde_json::Value;
use thiserror::Error;

/// Bundler JSON-RPC error codes (stable API, ERC-7769 registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Request does not match any supported method / params shape.
    InvalidRequest,
    /// Invalid fields: bad version, content-type, envelope or userOpHash.
    InvalidFields,
    /// Account validation reverted during simulation.
    SimulateValidation,
    /// Paymaster validation reverted during simulation.
    SimulatePaymasterValidation,
    /// Banned opcode used during validation.
    OpcodeValidation,
    /// Operation validity window expires too soon.
    ExpiresShortly,
    /// Entity is throttled or banned.
    Reputation,
    /// Entity stake or unstake delay too low.
    InsufficientStake,
    /// Aggregator not supported.
    UnsupportedSignatureAggregator,
    /// Signature check failed.
    InvalidSignature,
    /// Paymaster deposit too low.
    PaymasterDepositTooLow,
    /// Operation reverted during execution.
    UserOperationReverted,
    /// Unregistered bucket for unexpected failures.
    InternalError,
}

impl ErrorCode {
    /// Numeric JSON-RPC code.
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::InvalidRequest => -32601,
            ErrorCode::InvalidFields => -32602,
            ErrorCode::SimulateValidation => -32500,
            ErrorCode::SimulatePaymasterValidation => -32501,
            ErrorCode::OpcodeValidation => -32502,
            ErrorCode::ExpiresShortly => -32503,
            ErrorCode::Reputation => -32504,
            ErrorCode::InsufficientStake => -32505,
            ErrorCode::UnsupportedSignatureAggregator => -32506,
            ErrorCode::InvalidSignature => -32507,
            ErrorCode::PaymasterDepositTooLow => -32508,
            ErrorCode::UserOperationReverted => -32521,
            ErrorCode::InternalError => -32603,
        }
    }

    /// Stable name, used in logs and test vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InvalidFields => "INVALID_FIELDS",
            ErrorCode::SimulateValidation => "SIMULATE_VALIDATION",
            ErrorCode::SimulatePaymasterValidation => "SIMULATE_PAYMASTER_VALIDATION",
            ErrorCode::OpcodeValidation => "OPCODE_VALIDATION",
            ErrorCode::ExpiresShortly => "EXPIRES_SHORTLY",
            ErrorCode::Reputation => "REPUTATION",
            ErrorCode::InsufficientStake => "INSUFFICIENT_STAKE",
            ErrorCode::UnsupportedSignatureAggregator => "UNSUPPORTED_SIGNATURE_AGGREGATOR",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::PaymasterDepositTooLow => "PAYMASTER_DEPOSIT_TOO_LOW",
            ErrorCode::UserOperationReverted => "USER_OPERATION_REVERTED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Protocol-level error surfaced to the caller as `{message, code, data}`.
///
/// The message is sent verbatim: client tooling matches on it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RpcError {
    pub message: String,
    pub code: ErrorCode,
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            data: None,
        }
    }

    pub fn invalid_fields(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFields, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Attach structured `data` to the error.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BundlerRpcError>;

/// Startup / configuration errors used by core and server.
#[derive(Debug, Error)]
pub enum BundlerRpcError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unsupported config version: {0}")]
    UnsupportedConfigVersion(u32),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
