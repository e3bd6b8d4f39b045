//! HTTP route handlers and the per-request metrics hook.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{MatchedPath, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use bundler_rpc_core::protocol::BundlerMethod;

use crate::app_state::AppState;
use crate::dispatch::{RawBody, RpcInput, Transport};
use crate::obs::MetricsSample;
use crate::transport::reply::{HttpReply, RpcObservation, RpcStatus};

/// `POST /rpc` and `POST /`: default API version.
pub async fn rpc_http_default(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    dispatch_http(&app, None, &headers, body).await
}

/// `POST /:version/rpc`.
pub async fn rpc_http_versioned(
    State(app): State<AppState>,
    Path(version): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    dispatch_http(&app, Some(&version), &headers, body).await
}

async fn dispatch_http(
    app: &AppState,
    version: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let mut reply = HttpReply::new();
    let input = RpcInput {
        transport: Transport::Http,
        version,
        content_type,
        body: RawBody::Bytes(body),
    };
    app.pipeline().handle(input, &mut reply).await;
    reply.into_response()
}

/// Records one sample per completed HTTP request.
///
/// Installed as a route layer so the matched route template is available;
/// labels for the RPC method and outcome come back on the response extensions.
/// WebSocket upgrades are handed off to the session gauge instead.
pub async fn track_metrics(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let http_method = req.method().clone();
    let start = Instant::now();

    let resp = next.run(req).await;
    if resp.status() == StatusCode::SWITCHING_PROTOCOLS {
        return resp;
    }

    let obs = resp
        .extensions()
        .get::<RpcObservation>()
        .copied()
        .unwrap_or_default();
    app.metrics().record_http(&MetricsSample {
        route: &route,
        status_code: resp.status().as_u16(),
        http_method: http_method.as_str(),
        rpc_method: obs.rpc_method.map(BundlerMethod::as_str).unwrap_or("none"),
        rpc_status: obs.rpc_status.map(RpcStatus::as_str).unwrap_or("none"),
        duration: start.elapsed(),
    });

    resp
}
