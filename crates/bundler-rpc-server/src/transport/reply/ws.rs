use async_trait::async_trait;
use axum::extract::ws::Message;
use axum::http::StatusCode;
use serde_json::Value;
use tokio::sync::mpsc;

use bundler_rpc_core::wire;

use super::{ReplyError, RpcReply, RpcStatus};

/// Reply for one inbound frame, written through the connection's outbound queue.
#[derive(Debug)]
pub struct WsReply {
    tx: mpsc::Sender<Message>,
    rpc_status: Option<RpcStatus>,
    sent: bool,
}

impl WsReply {
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        Self {
            tx,
            rpc_status: None,
            sent: false,
        }
    }

    pub fn rpc_status(&self) -> Option<RpcStatus> {
        self.rpc_status
    }
}

#[async_trait]
impl RpcReply for WsReply {
    fn set_rpc_status(&mut self, status: RpcStatus) -> &mut dyn RpcReply {
        self.rpc_status = Some(status);
        self
    }

    fn status(&mut self, _status: StatusCode) -> &mut dyn RpcReply {
        self
    }

    async fn send(&mut self, payload: &Value) -> Result<(), ReplyError> {
        if self.sent {
            return Err(ReplyError::AlreadySent);
        }
        let text = wire::encode(payload)?;
        // A dead connection still consumes the one send.
        self.sent = true;
        self.tx
            .send(Message::Text(text))
            .await
            .map_err(|_| ReplyError::ChannelClosed)
    }
}
