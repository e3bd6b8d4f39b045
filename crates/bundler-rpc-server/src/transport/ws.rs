//! WebSocket transport.
//!
//! Responsibilities:
//! - Upgrade `GET /:version/rpc` (plain GETs get a 404 hint instead)
//! - Decode each frame once; non-JSON frames are answered inline
//! - Feed JSON frames to the pipeline in arrival order, one at a time
//! - Keep the connection open across frames
//!
//! Three tasks per connection: the reader (this loop), a frame worker that
//! owns dispatch order, and a writer that drains the outbound queue.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::Instrument;

use bundler_rpc_core::wire;

use crate::app_state::AppState;
use crate::dispatch::{RawBody, RpcInput, Transport};
use crate::transport::codec::{decode, Inbound};
use crate::transport::reply::WsReply;

const OUTBOUND_QUEUE: usize = 1024;
const INBOUND_QUEUE: usize = 256;

pub async fn rpc_ws(
    State(app): State<AppState>,
    Path(version): Path<String>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let Some(ws) = ws else {
        return (
            StatusCode::NOT_FOUND,
            format!("GET /{version}/rpc not supported, use POST"),
        )
            .into_response();
    };

    let max = app.cfg().server.websocket_max_payload_size;
    ws.max_message_size(max)
        .max_frame_size(max)
        .on_upgrade(move |socket| {
            let span = tracing::info_span!("ws_session", %version);
            run_session(app, version, socket).instrument(span)
        })
}

async fn run_session(app: AppState, version: String, socket: WebSocket) {
    let metrics = app.metrics();
    metrics.ws_sessions_active.inc(&[]);
    tracing::debug!("session opened");

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    let (frame_tx, frame_rx) = mpsc::channel::<Inbound>(INBOUND_QUEUE);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(m) = out_rx.recv().await {
            if ws_tx.send(m).await.is_err() {
                break;
            }
        }
    });
    let worker = tokio::spawn(
        frame_worker(app.clone(), version, frame_rx, out_tx.clone()).in_current_span(),
    );

    while let Some(incoming) = ws_rx.next().await {
        let msg = match incoming {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "socket read failed");
                break;
            }
        };

        let inbound = decode(msg);
        match inbound {
            Inbound::Request(_) => {}
            Inbound::Invalid(_) => metrics.ws_invalid_frames.inc(&[]),
            // tungstenite answers pings itself
            Inbound::Ping | Inbound::Pong => continue,
            Inbound::Close => break,
        }
        if frame_tx.send(inbound).await.is_err() {
            break;
        }
    }

    // Replies for a closed socket have nowhere to go.
    worker.abort();
    drop(out_tx);
    let _ = writer.await;

    metrics.ws_sessions_active.dec(&[]);
    tracing::debug!("session closed");
}

/// Processes one connection's frames strictly in arrival order.
async fn frame_worker(
    app: AppState,
    version: String,
    mut frames: mpsc::Receiver<Inbound>,
    out: mpsc::Sender<Message>,
) {
    let pipeline = app.pipeline();
    while let Some(frame) = frames.recv().await {
        match frame {
            Inbound::Request(body) => {
                let mut reply = WsReply::new(out.clone());
                let input = RpcInput {
                    transport: Transport::WebSocket,
                    version: Some(&version),
                    content_type: None,
                    body: RawBody::Json(body),
                };
                pipeline.handle(input, &mut reply).await;
            }
            Inbound::Invalid(payload) => {
                tracing::info!(reply = %payload, "invalid frame");
                match wire::encode(&payload) {
                    Ok(text) => {
                        if out.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "invalid-frame reply encode failed"),
                }
            }
            Inbound::Ping | Inbound::Pong | Inbound::Close => {}
        }
    }
}
