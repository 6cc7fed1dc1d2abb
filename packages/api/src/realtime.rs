//! WebSocket feed of display events.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};

use queue_core::{DepartmentId, QueueEvent};

use crate::error::ApiError;
use crate::routes::department_param;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    department_id: Option<String>,
}

/// `GET /ws?department_id=`: every display event, or one department's.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    let filter = match query.department_id {
        Some(raw) => Some(department_param(Some(raw))?),
        None => None,
    };

    // Subscribe before the upgrade so no event published meanwhile is lost.
    let events = state.events().subscribe();

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, events, filter)))
}

/// Serialize an event as a display frame.
pub fn frame(event: &QueueEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!("Failed to serialize {}: {}", event.description(), e);
            None
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    mut events: broadcast::Receiver<QueueEvent>,
    filter: Option<DepartmentId>,
) {
    match filter {
        Some(department_id) => tracing::info!("Display connected for department {}", department_id),
        None => tracing::info!("Display connected for all departments"),
    }

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if filter.is_some_and(|id| id != event.department_id()) {
                        continue;
                    }
                    let Some(json) = frame(&event) else {
                        continue;
                    };
                    if let Err(e) = sender.send(Message::Text(json.into())).await {
                        tracing::debug!("Display send failed: {}", e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Display lagging, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!("Display socket error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("Display disconnected");
}
