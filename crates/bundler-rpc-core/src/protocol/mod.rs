//! Wire protocol: the JSON-RPC envelope and the bundler method schema.
//!
//! Validation happens in two stages:
//! - `envelope`: generic JSON-RPC 2.0 shape (`jsonrpc`, `id`, `method`, `params`).
//! - `bundler`: closed method set with typed, per-method positional params.
//!
//! Both stages are panic-free: malformed input is reported as an error value
//! carrying the protocol error code the caller expects.

pub mod bundler;
pub mod envelope;

pub use bundler::{BundlerCall, BundlerMethod, BundlerRequest, SchemaError, MISSING_USER_OP_HASH};
pub use envelope::{EnvelopeError, JsonRpcRequest, RequestId};
