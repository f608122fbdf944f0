//! The `/ws` channel (§6, §4.7). Oblivious to message semantics beyond
//! decoding JSON into [`wg_session::SessionEvent`] and encoding
//! [`wg_session::SessionOutput`] back out; the session driver does
//! everything else.

use crate::state::AppState;
use crate::wire::{ClientMessage, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use wg_core::constants::HANDSHAKE_TIMEOUT_SECS;
use wg_core::SessionState;
use wg_session::{coalesce, try_drain_all, SessionDriver, SessionOutput};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let remote_addr = "peer".to_string();
    let (mut sender, mut receiver) = socket.split();
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();

    let reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    if event_tx.send(client_msg.into_event()).is_err() {
                        break;
                    }
                }
                Err(err) => tracing::warn!(error = %err, "dropping malformed client message"),
            }
        }
    });

    let mut driver = SessionDriver::new(remote_addr, state.orchestrator.clone(), state.seed_cache.clone());
    let handshake_deadline = tokio::time::sleep(Duration::from_secs(HANDSHAKE_TIMEOUT_SECS));
    tokio::pin!(handshake_deadline);

    loop {
        tokio::select! {
            _ = &mut handshake_deadline, if driver.state() == SessionState::AwaitingHandshake => {
                send_all(&mut sender, driver.handle_handshake_timeout()).await;
                break;
            }
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else { break };
                let mut batch = vec![event];
                batch.extend(try_drain_all(&mut event_rx));
                let mut closed = false;
                for event in coalesce(batch) {
                    let outputs = driver.handle_event(event).await;
                    closed = outputs_closed(&driver, &outputs);
                    send_all(&mut sender, outputs).await;
                    if closed {
                        break;
                    }
                }
                if closed {
                    break;
                }
            }
        }
    }

    reader.abort();
    let _ = sender.close().await;
}

fn outputs_closed(driver: &SessionDriver, _outputs: &[SessionOutput]) -> bool {
    driver.state() == SessionState::Closed
}

async fn send_all(sender: &mut SplitSink<WebSocket, Message>, outputs: Vec<SessionOutput>) {
    for output in outputs {
        let message: ServerMessage = output.into();
        if let Ok(text) = serde_json::to_string(&message) {
            let _ = sender.send(Message::Text(text)).await;
        }
    }
}
