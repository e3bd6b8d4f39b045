//! Decode-once codec for socket frames.
//!
//! - Text frames => one JSON value, or an invalid-frame reply
//! - Binary frames => decoded as UTF-8 and treated like text
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use serde_json::{json, Value};

use bundler_rpc_core::protocol::envelope::JsonRpcVersion;
use bundler_rpc_core::ErrorCode;

const INVALID_FRAME_MESSAGE: &str = "invalid JSON-RPC request";

#[derive(Debug)]
pub enum Inbound {
    /// Parsed JSON, ready for the pipeline.
    Request(Value),
    /// Not JSON; carries the reply to send back without dispatching.
    Invalid(Value),
    Ping,
    Pong,
    Close,
}

pub fn decode(msg: Message) -> Inbound {
    match msg {
        Message::Text(s) => decode_text(&s),
        Message::Binary(b) => match String::from_utf8(b) {
            Ok(s) => decode_text(&s),
            Err(e) => Inbound::Invalid(invalid_frame_reply(&String::from_utf8_lossy(e.as_bytes()))),
        },
        Message::Ping(_) => Inbound::Ping,
        Message::Pong(_) => Inbound::Pong,
        Message::Close(_) => Inbound::Close,
    }
}

fn decode_text(s: &str) -> Inbound {
    match serde_json::from_str::<Value>(s) {
        Ok(v) => Inbound::Request(v),
        Err(_) => Inbound::Invalid(invalid_frame_reply(s)),
    }
}

/// Fixed InvalidFields shape answered inline for a frame that is not JSON.
pub fn invalid_frame_reply(frame: &str) -> Value {
    json!({
        "jsonrpc": JsonRpcVersion::STR,
        "id": null,
        "error": {
            "message": INVALID_FRAME_MESSAGE,
            "data": frame,
            "code": ErrorCode::InvalidFields.code(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frame_becomes_request() {
        let Inbound::Request(v) = decode(Message::Text(r#"{"id":1}"#.into())) else {
            panic!("expected request");
        };
        assert_eq!(v["id"], 1);
    }

    #[test]
    fn broken_json_is_answered_inline() {
        let Inbound::Invalid(reply) = decode(Message::Text("{bad json".into())) else {
            panic!("expected invalid frame");
        };
        assert_eq!(
            reply,
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"message": "invalid JSON-RPC request", "data": "{bad json", "code": -32602}
            })
        );
    }

    #[test]
    fn binary_frames_are_read_as_text() {
        assert!(matches!(decode(Message::Binary(b"[1,2]".to_vec())), Inbound::Request(_)));
        assert!(matches!(decode(Message::Binary(vec![0xff, 0xfe])), Inbound::Invalid(_)));
    }

    #[test]
    fn control_frames_pass_through() {
        assert!(matches!(decode(Message::Ping(vec![1])), Inbound::Ping));
        assert!(matches!(decode(Message::Close(None)), Inbound::Close));
    }
}
