//! Shared application state for the bundler RPC server.
//!
//! Built once at startup; cloned into every handler. Everything behind the
//! `Arc`s is read-only apart from the metrics registry.

use std::sync::Arc;

use bundler_rpc_core::error::Result;

use crate::config::ServerConfig;
use crate::dispatch::{ErrorReporter, LogReporter, MethodHandler, RequestPipeline};
use crate::obs::ServerMetrics;

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ServerConfig>,
    pipeline: Arc<RequestPipeline>,
    metrics: Arc<ServerMetrics>,
}

impl AppState {
    /// Build application state with the log-only error reporter.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: ServerConfig, handler: Arc<dyn MethodHandler>) -> Result<Self> {
        Self::with_reporter(cfg, handler, Arc::new(LogReporter))
    }

    pub fn with_reporter(
        cfg: ServerConfig,
        handler: Arc<dyn MethodHandler>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        let pipeline = RequestPipeline::new(&cfg.rpc, handler, reporter)?;
        Ok(Self {
            cfg: Arc::new(cfg),
            pipeline: Arc::new(pipeline),
            metrics: Arc::new(ServerMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.cfg
    }

    pub fn pipeline(&self) -> Arc<RequestPipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }
}
