use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use sitecraft_core::events::SiteEvent;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::auth::AdminUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/listen", get(listen))
}

/// Stream page events to an admin client as JSON text frames.
async fn listen(user: AdminUser, State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let events = state.event_bus().subscribe();
    tracing::debug!(sub = %user.subject, "admin listener connected");
    ws.on_upgrade(move |socket| forward_events(socket, events))
}

async fn forward_events(mut socket: WebSocket, mut events: broadcast::Receiver<SiteEvent>) {
    if send_event(&mut socket, &SiteEvent::Welcome).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    if send_event(&mut socket, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Client missed events; it should refetch instead of patching.
                    tracing::warn!(skipped, "admin listener lagged");
                    let _ = send_event(&mut socket, &SiteEvent::Reconnect).await;
                    break;
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::debug!("admin listener disconnected");
}

async fn send_event(socket: &mut WebSocket, event: &SiteEvent) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode event");
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await
}
