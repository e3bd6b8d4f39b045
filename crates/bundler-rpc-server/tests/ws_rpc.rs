#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use bundler_rpc_core::ErrorCode;
use common::{app, metrics_text, Mode, TestApp};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WS_CONFIG: &str = "version: 1\nserver:\n  websocket: true\n";

async fn serve(t: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = t.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, version: &str) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/{version}/rpc")).await.unwrap();
    ws
}

async fn next_json(ws: &mut Client) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("reply in time")
        .expect("stream open")
        .unwrap();
    match msg {
        Message::Text(s) => serde_json::from_str(&s).unwrap(),
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_frame_is_answered_without_dispatch() {
    let t = app(WS_CONFIG, Mode::Echo);
    let addr = serve(&t).await;
    let mut ws = connect(addr, "v1").await;

    ws.send(Message::Text("{bad json".into())).await.unwrap();
    let reply = next_json(&mut ws).await;

    assert_eq!(reply["id"], json!(null));
    assert_eq!(reply["error"]["code"], ErrorCode::InvalidFields.code());
    assert_eq!(reply["error"]["data"], "{bad json");
    assert_eq!(t.handler.calls(), 0);
    assert_eq!(t.state.metrics().ws_invalid_frames.get(&[]), 1);

    // the connection stays usable
    ws.send(Message::Text(
        r#"{"jsonrpc":"2.0","id":2,"method":"eth_chainId","params":[]}"#.into(),
    ))
    .await
    .unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["id"], 2);
    assert_eq!(reply["result"], json!({"method": "eth_chainId", "version": "v1"}));
    assert_eq!(t.handler.calls(), 1);
}

#[tokio::test]
async fn frames_are_answered_in_arrival_order() {
    let t = app(WS_CONFIG, Mode::Echo);
    let addr = serve(&t).await;
    let mut ws = connect(addr, "v2").await;

    for id in 1..=5 {
        let frame = json!({"jsonrpc": "2.0", "id": id, "method": "eth_supportedEntryPoints"});
        ws.send(Message::Text(frame.to_string())).await.unwrap();
    }
    ws.send(Message::Text("nope".into())).await.unwrap();

    for id in 1..=5 {
        let reply = next_json(&mut ws).await;
        assert_eq!(reply["id"], id);
        assert_eq!(reply["result"]["version"], "v2");
    }
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["error"]["data"], "nope");
}

#[tokio::test]
async fn version_errors_are_per_frame() {
    let t = app(WS_CONFIG, Mode::Echo);
    let addr = serve(&t).await;
    let mut ws = connect(addr, "v7").await;

    ws.send(Message::Text(
        r#"{"jsonrpc":"2.0","id":9,"method":"eth_chainId","params":[]}"#.into(),
    ))
    .await
    .unwrap();
    let reply = next_json(&mut ws).await;

    assert_eq!(reply["id"], json!(null));
    assert_eq!(reply["error"]["code"], ErrorCode::InvalidFields.code());
    assert!(reply["error"]["message"].as_str().unwrap().contains("v7"));
    assert_eq!(t.handler.calls(), 0);
}

#[tokio::test]
async fn handler_failure_keeps_socket_open() {
    let t = app(WS_CONFIG, Mode::Fail("mempool unavailable"));
    let addr = serve(&t).await;
    let mut ws = connect(addr, "v1").await;
    let frame = r#"{"jsonrpc":"2.0","id":"a","method":"eth_chainId","params":[]}"#;

    for _ in 0..2 {
        ws.send(Message::Text(frame.into())).await.unwrap();
        let reply = next_json(&mut ws).await;
        assert_eq!(
            reply,
            json!({"jsonrpc": "2.0", "id": "a", "error": {"message": "mempool unavailable"}})
        );
    }
    assert_eq!(t.reporter.count(), 2);
}

#[tokio::test]
async fn upgrade_is_refused_when_websocket_is_disabled() {
    let t = app("version: 1\n", Mode::Echo);
    let addr = serve(&t).await;

    assert!(connect_async(format!("ws://{addr}/v1/rpc")).await.is_err());
}

#[tokio::test]
async fn oversized_frame_closes_the_connection() {
    let t = app("version: 1\nserver:\n  websocket: true\n  websocket_max_payload_size: 64\n", Mode::Echo);
    let addr = serve(&t).await;
    let mut ws = connect(addr, "v1").await;

    let frame = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_chainId",
        "params": [],
        "pad": "x".repeat(256)
    });
    // the socket may already be gone by the time the write is flushed
    let _ = ws.send(Message::Text(frame.to_string())).await;

    let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("connection closes in time");
    match next {
        None | Some(Err(_)) | Some(Ok(Message::Close(_))) => {}
        Some(Ok(other)) => panic!("expected close, got {other:?}"),
    }
    assert_eq!(t.handler.calls(), 0);
}

#[tokio::test]
async fn upgrades_are_not_http_request_samples() {
    let t = app(WS_CONFIG, Mode::Echo);
    let addr = serve(&t).await;
    let mut ws = connect(addr, "v1").await;

    ws.send(Message::Text(
        r#"{"jsonrpc":"2.0","id":1,"method":"eth_chainId","params":[]}"#.into(),
    ))
    .await
    .unwrap();
    next_json(&mut ws).await;

    assert_eq!(t.state.metrics().ws_sessions_active.get(&[]), 1);
    let text = metrics_text(&t.router).await;
    assert!(!text.contains("bundler_http_requests_total{"), "{text}");
}
