//! bundler-rpc server binary.
//!
//! - Config: YAML path from the first argument (default `bundler-rpc.yaml`)
//! - Logging: `RUST_LOG`, falling back to `server.log_level`
//! - HTTP JSON-RPC on `/rpc` and `/:version/rpc`, optional WebSocket upgrade
//! - Graceful shutdown on Ctrl-C

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use bundler_rpc_server::{app_state, config, router, services::ChainInfoHandler};

const DEFAULT_CONFIG_PATH: &str = "bundler-rpc.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Config is loaded before the subscriber exists, so report on stderr.
    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config load failed ({path}): {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.server.log_level));
    fmt().with_env_filter(filter).init();

    let listen = cfg.server.listen_addr();
    let websocket = cfg.server.websocket;
    let handler = Arc::new(ChainInfoHandler::new(&cfg.chain));
    let state = match app_state::AppState::new(cfg, handler) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "state init failed");
            return ExitCode::FAILURE;
        }
    };
    let app = router::build_router(state);

    let listener = match tokio::net::TcpListener::bind(&listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%listen, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%listen, websocket, "bundler-rpc listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("bundler-rpc stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl-c handler failed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining");
}
