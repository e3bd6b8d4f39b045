//! Top-level facade crate for the bundler RPC server.
//!
//! Re-exports the wire contracts and the server library so users can depend on a single crate.

pub mod core {
    pub use bundler_rpc_core::*;
}

pub mod server {
    pub use bundler_rpc_server::*;
}
