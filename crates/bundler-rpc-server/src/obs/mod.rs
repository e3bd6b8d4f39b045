//! In-process metrics.
//!
//! Metrics are stored as atomics in a process-wide registry owned by
//! `AppState` and rendered by the `/metrics` handler.

pub mod metrics;

pub use metrics::{MetricsSample, ServerMetrics};
