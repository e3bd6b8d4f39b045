//! Built-in method handlers.

pub mod chain_info;

pub use chain_info::ChainInfoHandler;
