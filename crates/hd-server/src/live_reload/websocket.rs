//! WebSocket transport for reload clients.
//!
//! Each accepted connection registers a [`ChannelClient`] and forwards every
//! queued signal to the socket as a text frame. Whatever the client sends is
//! ignored.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::mpsc;

use super::registry::{ClientRegistry, ReloadClient, ReloadSignal, SendError};

/// Registry entry backed by the connection task's queue.
pub(crate) struct ChannelClient {
    tx: mpsc::UnboundedSender<ReloadSignal>,
}

impl ReloadClient for ChannelClient {
    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, signal: ReloadSignal) -> Result<(), SendError> {
        self.tx.send(signal).map_err(|_| SendError)
    }
}

/// Handle WebSocket upgrade on any path.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(registry): State<Arc<ClientRegistry>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, registry))
}

/// Handle an established WebSocket connection.
async fn handle_socket(mut socket: WebSocket, registry: Arc<ClientRegistry>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ReloadSignal>();
    let id = registry.register(Arc::new(ChannelClient { tx }));
    tracing::debug!(client = %id, clients = registry.len(), "Reload client connected");

    loop {
        tokio::select! {
            // Forward reload signals to client
            signal = rx.recv() => {
                let Some(signal) = signal else { break };
                if socket.send(Message::Text(signal.as_str().into())).await.is_err() {
                    break;
                }
            }
            // Drain client frames until the connection ends
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Closing the queue first makes the client read as closed to any
    // broadcast that already took a snapshot.
    rx.close();
    registry.remove(id);
    tracing::debug!(client = %id, clients = registry.len(), "Reload client disconnected");
}
