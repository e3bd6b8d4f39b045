//! Request policy (method allow-list).
//!
//! Compiles the configured method names into a fast lookup set once at
//! startup; the pipeline consults it for every request.

pub mod allowlist;

pub use allowlist::MethodAllowList;
