//! Request pipeline: one inbound unit of work in, exactly one reply out.
//!
//! Steps, short-circuiting on the first failure:
//! 1. resolve the API version from the path (or the configured default)
//! 2. HTTP only: require a JSON content-type
//! 3. validate the generic JSON-RPC envelope
//! 4. remember the request id for every later reply
//! 5. validate the bundler method/params schema
//! 6. enforce the method allow-list
//! 7. call the method handler
//! 8. send the result, or map the failure and send the error
//!
//! Nothing escapes `handle`: every path ends in a single `send`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::FutureExt;
use serde_json::Value;

use bundler_rpc_core::error::Result;
use bundler_rpc_core::protocol::envelope::success_response;
use bundler_rpc_core::protocol::{BundlerMethod, BundlerRequest, JsonRpcRequest, RequestId};
use bundler_rpc_core::{version, ApiVersion, RpcError};

use super::error_map::{map_failure, Failure, PanicError};
use super::handler::{ErrorReport, ErrorReporter, MethodHandler};
use crate::config::RpcSection;
use crate::policy::MethodAllowList;
use crate::transport::reply::{ReplyError, RpcReply, RpcStatus};

/// Which transport delivered the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    WebSocket,
}

/// Request body as handed over by the transport.
#[derive(Debug, Clone)]
pub enum RawBody {
    /// Unparsed HTTP body.
    Bytes(Bytes),
    /// Socket frame already decoded as JSON.
    Json(Value),
}

/// One inbound unit of work.
#[derive(Debug, Clone)]
pub struct RpcInput<'a> {
    pub transport: Transport,
    /// `:version` path segment, if the route has one.
    pub version: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: RawBody,
}

/// What is known about the request so far, for error replies.
#[derive(Debug, Default)]
struct DispatchCtx {
    id: RequestId,
    method: Option<BundlerMethod>,
}

pub struct RequestPipeline {
    handler: Arc<dyn MethodHandler>,
    reporter: Arc<dyn ErrorReporter>,
    default_version: ApiVersion,
    supported_versions: Vec<ApiVersion>,
    allow_list: MethodAllowList,
}

impl RequestPipeline {
    pub fn new(
        rpc: &RpcSection,
        handler: Arc<dyn MethodHandler>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self> {
        Ok(Self {
            handler,
            reporter,
            default_version: rpc.default_api_version,
            supported_versions: rpc.api_versions.clone(),
            allow_list: MethodAllowList::compile(rpc.methods.as_deref())?,
        })
    }

    pub async fn handle(&self, input: RpcInput<'_>, reply: &mut dyn RpcReply) {
        let mut ctx = DispatchCtx::default();
        let failure = match self.dispatch(input, reply, &mut ctx).await {
            Ok(()) => return,
            Err(f) => f,
        };
        self.reply_failure(&failure, &ctx, reply).await;
    }

    async fn dispatch(
        &self,
        input: RpcInput<'_>,
        reply: &mut dyn RpcReply,
        ctx: &mut DispatchCtx,
    ) -> std::result::Result<(), Failure> {
        let version = version::resolve(input.version, self.default_version, &self.supported_versions)?;

        if input.transport == Transport::Http && !is_json_content_type(input.content_type) {
            return Err(RpcError::invalid_fields("invalid content-type, must be application/json").into());
        }

        let parsed = match input.body {
            RawBody::Bytes(raw) => {
                tracing::trace!(body = %String::from_utf8_lossy(&raw), "received request");
                JsonRpcRequest::from_slice(&raw)
            }
            RawBody::Json(v) => {
                tracing::trace!(body = %v, "received request");
                JsonRpcRequest::from_value(v)
            }
        };
        let envelope = parsed.map_err(|e| {
            ctx.id = e.id;
            Failure::from(e.error)
        })?;
        ctx.id = envelope.id.clone();

        let request = BundlerRequest::try_from(envelope).map_err(RpcError::from)?;
        let method = request.method();
        ctx.method = Some(method);
        reply.set_rpc_method(method);

        if !self.allow_list.is_allowed(method) {
            return Err(RpcError::invalid_request(format!("Method not supported: {method}")).into());
        }

        tracing::info!(%method, %version, id = %ctx.id, call = ?request.call(), "incoming request");

        let result = self.invoke(&request, version).await?;
        let payload = success_response(&ctx.id, result);

        let sent = reply
            .set_rpc_status(RpcStatus::Success)
            .status(StatusCode::OK)
            .send(&payload)
            .await;
        match sent {
            Ok(()) => {}
            Err(ReplyError::Encode(e)) => return Err(Failure::Internal(Box::new(e))),
            Err(e) => {
                tracing::debug!(%method, error = %e, "reply not delivered");
                return Ok(());
            }
        }

        if method == BundlerMethod::GetUserOperationReceipt && !payload["result"].is_null() {
            tracing::info!(%method, id = %ctx.id, result = "<reduced>", "sent reply");
        } else {
            tracing::info!(%method, reply = %payload, "sent reply");
        }
        Ok(())
    }

    /// Call the handler, turning a panic into a failure instead of unwinding.
    async fn invoke(
        &self,
        request: &BundlerRequest,
        version: ApiVersion,
    ) -> std::result::Result<Value, Failure> {
        match AssertUnwindSafe(self.handler.handle_method(request, version))
            .catch_unwind()
            .await
        {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(e.into()),
            Err(payload) => Err(Failure::Panic(PanicError(panic_message(payload.as_ref())))),
        }
    }

    async fn reply_failure(&self, failure: &Failure, ctx: &DispatchCtx, reply: &mut dyn RpcReply) {
        let mapped = map_failure(failure);
        let payload = mapped.payload(&ctx.id);

        self.report(failure, ctx);

        let sent = reply
            .set_rpc_status(mapped.rpc_status)
            .status(mapped.http_status)
            .send(&payload)
            .await;

        match failure {
            Failure::Rpc(_) => tracing::info!(reply = %payload, "error reply"),
            Failure::Internal(e) => tracing::error!(error = %e, id = %ctx.id, "error reply (non-rpc)"),
            Failure::Panic(p) => tracing::error!(error = %p, id = %ctx.id, "error reply (unhandled type)"),
        }

        if let Err(e) = sent {
            tracing::debug!(error = %e, id = %ctx.id, "error reply not delivered");
        }
    }

    fn report(&self, failure: &Failure, ctx: &DispatchCtx) {
        if let Some(error) = failure.unexpected() {
            self.reporter.capture(&ErrorReport {
                request_id: &ctx.id,
                rpc_method: ctx.method.map(BundlerMethod::as_str),
                error,
            });
        }
    }
}

/// Compare on the media type essence, ignoring parameters such as charset.
fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
