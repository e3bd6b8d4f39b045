use async_trait::async_trait;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use bundler_rpc_core::protocol::envelope::bare_error_response;
use bundler_rpc_core::protocol::{BundlerMethod, RequestId};
use bundler_rpc_core::wire;

use super::{ReplyError, RpcReply, RpcStatus};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Labels the metrics hook reads back from the response extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcObservation {
    pub rpc_method: Option<BundlerMethod>,
    pub rpc_status: Option<RpcStatus>,
}

/// Buffered HTTP reply.
#[derive(Debug)]
pub struct HttpReply {
    status: StatusCode,
    observation: RpcObservation,
    body: Option<String>,
}

impl Default for HttpReply {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpReply {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            observation: RpcObservation::default(),
            body: None,
        }
    }

    pub fn into_response(self) -> Response {
        let (status, body) = match self.body {
            Some(body) => (self.status, body),
            None => {
                tracing::error!("pipeline finished without a reply");
                let fallback = bare_error_response(&RequestId::Null, "Unknown error");
                (StatusCode::INTERNAL_SERVER_ERROR, fallback.to_string())
            }
        };

        let mut resp = (status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response();
        resp.extensions_mut().insert(self.observation);
        resp
    }
}

#[async_trait]
impl RpcReply for HttpReply {
    fn set_rpc_status(&mut self, status: RpcStatus) -> &mut dyn RpcReply {
        self.observation.rpc_status = Some(status);
        self
    }

    fn status(&mut self, status: StatusCode) -> &mut dyn RpcReply {
        self.status = status;
        self
    }

    fn set_rpc_method(&mut self, method: BundlerMethod) {
        self.observation.rpc_method = Some(method);
    }

    async fn send(&mut self, payload: &Value) -> Result<(), ReplyError> {
        if self.body.is_some() {
            return Err(ReplyError::AlreadySent);
        }
        self.body = Some(wire::encode(payload)?);
        Ok(())
    }
}
