//! Axum router wiring.
//!
//! - `POST /rpc`, `POST /`      : default API version
//! - `POST /:version/rpc`       : explicit API version
//! - `GET /:version/rpc`        : WebSocket upgrade (when enabled)
//! - `GET /health`, `/metrics`  : ops, not counted in request metrics
//!
//! The timeout sits inside the metrics hook so a timed-out request is still
//! recorded (as a 408). Request bodies are not size-limited; only socket
//! frames are.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let server = &state.cfg().server;
    let timeout = Duration::from_millis(server.timeout_ms);

    let versioned = if server.websocket {
        post(transport::http::rpc_http_versioned).get(transport::ws::rpc_ws)
    } else {
        post(transport::http::rpc_http_versioned)
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/rpc", post(transport::http::rpc_http_default))
        .route("/", post(transport::http::rpc_http_default))
        .route("/:version/rpc", versioned)
        .route_layer(TimeoutLayer::new(timeout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            transport::http::track_metrics,
        ))
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .with_state(state)
}
