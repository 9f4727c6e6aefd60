//! WebSocket progress subscriptions.
//!
//! One connection watches one user's progress: the client receives the
//! current snapshot immediately, then every new snapshot after a
//! successful transition, coalesced to the latest state. Closing the
//! socket unsubscribes.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use questline_domain::{OnboardingProgress, UserId};

use crate::app::App;
use crate::infrastructure::ports::ProgressNotifierPort;

use super::http::ApiError;

/// WebSocket upgrade handler - entry point for progress subscriptions.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(app): State<Arc<App>>,
) -> Result<Response, ApiError> {
    let user_id = UserId::new(user_id)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, app, user_id)))
}

/// Handle an individual subscription connection.
async fn handle_socket(socket: WebSocket, app: Arc<App>, user_id: UserId) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let connection_id = Uuid::new_v4();

    tracing::info!(
        connection_id = %connection_id,
        user_id = %user_id,
        "Progress subscription established"
    );

    // Initial snapshot straight from storage - the watch channel only holds
    // what was published since this process started.
    match app.use_cases.queries.get(&user_id).await {
        Ok(Some(progress)) => {
            if send_snapshot(&mut ws_sender, &progress).await.is_err() {
                return;
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(
                connection_id = %connection_id,
                user_id = %user_id,
                error = %e,
                "Failed to load initial snapshot"
            );
        }
    }

    let mut rx = app.notifier.subscribe(&user_id);
    // The stored value (if any) duplicates the snapshot we just sent
    rx.borrow_and_update();

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if let Some(progress) = snapshot {
                    if send_snapshot(&mut ws_sender, &progress).await.is_err() {
                        break;
                    }
                }
            }
            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {
                        // Subscriptions are one-way; ignore client chatter
                    }
                    Some(Err(e)) => {
                        tracing::debug!(
                            connection_id = %connection_id,
                            error = %e,
                            "WebSocket error"
                        );
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(
        connection_id = %connection_id,
        user_id = %user_id,
        "Progress subscription closed"
    );
}

async fn send_snapshot(
    sender: &mut (impl SinkExt<Message> + Unpin),
    progress: &OnboardingProgress,
) -> Result<(), ()> {
    match serde_json::to_string(progress) {
        Ok(json) => sender.send(Message::Text(json.into())).await.map_err(|_| ()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize progress snapshot");
            Ok(())
        }
    }
}
