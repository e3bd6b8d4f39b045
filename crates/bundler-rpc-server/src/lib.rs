//! bundler-rpc server library entry.
//!
//! This crate wires configuration, the request pipeline, both transports and
//! the ops endpoints into one axum application. It is intended to be consumed
//! by the binary (`main.rs`) and by integration tests, which can mount their
//! own `MethodHandler` through `AppState`.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod services;
pub mod transport;
