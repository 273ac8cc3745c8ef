use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use creativestalk_events::{RefreshContext, RefreshHub};
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::message::{ClientFrame, ServerFrame};

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Opens a refresh context for the connection.
///   2. Spawns a sender task that forwards refresh signals and heartbeats.
///   3. Processes inbound frames on the current task.
///   4. Cleans up on disconnect; dropping the context detaches its listener.
async fn handle_socket(socket: WebSocket, hub: Arc<RefreshHub>) {
    let context = hub.context();
    let context_id = context.id();
    tracing::info!(%context_id, "Refresh channel connected");

    let mut listener = context.listen();
    let (mut sink, mut stream) = socket.split();

    let send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;

        loop {
            let msg = tokio::select! {
                signal = listener.recv() => match signal {
                    Some(signal) => match serde_json::to_string(&ServerFrame::from_signal(&signal)) {
                        Ok(text) => Message::Text(text.into()),
                        Err(e) => {
                            tracing::warn!(%context_id, error = %e, "Failed to encode refresh frame");
                            continue;
                        }
                    },
                    None => break,
                },
                _ = heartbeat.tick() => Message::Ping(Bytes::new()),
            };
            if sink.send(msg).await.is_err() {
                tracing::debug!(%context_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => handle_client_frame(&context, text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(%context_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(%context_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    send_task.abort();
    tracing::info!(%context_id, "Refresh channel disconnected");
}

fn handle_client_frame(context: &RefreshContext, text: &str) {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Publish) => context.publish(),
        Ok(ClientFrame::Focus) => context.notify_focus(),
        Err(e) => {
            tracing::debug!(context_id = %context.id(), error = %e, "Ignoring unknown refresh frame");
        }
    }
}
