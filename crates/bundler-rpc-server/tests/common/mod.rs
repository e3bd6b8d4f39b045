#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use bundler_rpc_core::protocol::BundlerRequest;
use bundler_rpc_core::ApiVersion;
use bundler_rpc_server::app_state::AppState;
use bundler_rpc_server::config;
use bundler_rpc_server::dispatch::{ErrorReport, ErrorReporter, HandlerError, MethodHandler};
use bundler_rpc_server::router::build_router;

pub enum Mode {
    /// Reply with `{method, version}`.
    Echo,
    /// Reply with a fixed value.
    Value(Value),
    /// Fail with an unexpected error carrying this message.
    Fail(&'static str),
    Panic,
    /// Sleep, then reply with the value.
    Slow(Duration, Value),
}

pub struct RecordingHandler {
    mode: Mode,
    calls: AtomicUsize,
}

impl RecordingHandler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MethodHandler for RecordingHandler {
    async fn handle_method(
        &self,
        request: &BundlerRequest,
        version: ApiVersion,
    ) -> Result<Value, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            Mode::Echo => Ok(json!({"method": request.method().as_str(), "version": version.as_str()})),
            Mode::Value(v) => Ok(v.clone()),
            Mode::Fail(msg) => Err(HandlerError::internal(*msg)),
            Mode::Panic => panic!("handler exploded"),
            Mode::Slow(delay, v) => {
                tokio::time::sleep(*delay).await;
                Ok(v.clone())
            }
        }
    }
}

#[derive(Default)]
pub struct CountingReporter {
    count: AtomicUsize,
}

impl CountingReporter {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ErrorReporter for CountingReporter {
    fn capture(&self, _report: &ErrorReport<'_>) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub handler: Arc<RecordingHandler>,
    pub reporter: Arc<CountingReporter>,
}

pub fn app(yaml: &str, mode: Mode) -> TestApp {
    let cfg = config::load_from_str(yaml).expect("test config");
    let handler = Arc::new(RecordingHandler {
        mode,
        calls: AtomicUsize::new(0),
    });
    let reporter = Arc::new(CountingReporter::default());
    let state = AppState::with_reporter(cfg, handler.clone(), reporter.clone()).expect("state");
    let router = build_router(state.clone());
    TestApp {
        state,
        router,
        handler,
        reporter,
    }
}

pub const MINIMAL: &str = "version: 1\n";

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn metrics_text(router: &Router) -> String {
    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    send(router, req).await.1
}

pub async fn post_json(router: &Router, path: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    let (status, text) = send(router, req).await;
    (status, serde_json::from_str(&text).unwrap())
}
