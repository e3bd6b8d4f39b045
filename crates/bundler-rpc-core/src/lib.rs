//! bundler-rpc core: transport-agnostic wire contracts for the bundler RPC server.
//!
//! This crate defines the JSON-RPC envelope, the bundler method schema, API
//! versioning, the error-code registry and the wire serialization policy. It
//! carries no transport or runtime dependencies so it can be reused by clients
//! and test tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `RpcError` / `BundlerRpcError` so malformed
//! client input can never take the server down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod version;
pub mod wire;

pub use error::{BundlerRpcError, ErrorCode, Result, RpcError};
pub use version::ApiVersion;
