//! Observer WebSocket handler
//!
//! An observer opens the socket, sends `{"action":"start","projectId":..}`
//! to begin playback, and receives row-count, progress, and terminal
//! frames. A stop command on the same connection halts the project's
//! session; closing the socket stops every session this connection
//! started.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::AppState;
use crate::db;
use crate::playback::session::PlaybackSession;
use feedloop_common::events::{ObserverCommand, ObserverMessage, SessionStatus};

/// GET /api/v1/ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    info!("Observer connected");
    let (mut sink, mut stream) = socket.split();

    // Sessions write observer messages here; one writer owns the sink
    let (observer_tx, mut observer_rx) = mpsc::channel::<ObserverMessage>(256);
    let writer = tokio::spawn(async move {
        while let Some(message) = observer_rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize observer message: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Projects whose sessions were started on this connection
    let mut started: Vec<String> = Vec::new();

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ObserverCommand>(&text) {
            Ok(ObserverCommand::Start { project_id }) => {
                if start_session(&app, &project_id, observer_tx.clone()).await
                    && !started.contains(&project_id)
                {
                    started.push(project_id);
                }
            }
            Ok(ObserverCommand::Stop { project_id }) => {
                if !app.state.stop_session(&project_id).await {
                    warn!("Stop for project {} with no active session", project_id);
                }
            }
            Err(e) => {
                warn!("Ignoring malformed observer command: {}", e);
            }
        }
    }

    // Observer gone: implicit stop for every session it started
    info!("Observer disconnected");
    for project_id in &started {
        app.state.stop_session(project_id).await;
    }
    writer.abort();
}

/// Resolve the project's streams and spawn its session.
///
/// Returns true only when a new session was registered for this
/// connection. A duplicate start for an already-active project is
/// logged and ignored (the original connection keeps its session); a
/// record-store failure is reported to the observer as a terminal
/// error frame without internal detail.
async fn start_session(
    app: &AppState,
    project_id: &str,
    observer_tx: mpsc::Sender<ObserverMessage>,
) -> bool {
    let definitions = match db::streams::get_streams_for_project(&app.state.db, project_id).await {
        Ok(definitions) => definitions,
        Err(e) => {
            error!("Failed to load streams for project {}: {}", project_id, e);
            let _ = observer_tx
                .send(ObserverMessage::terminal(SessionStatus::Error, project_id))
                .await;
            return false;
        }
    };

    let (session, handle) = PlaybackSession::new(
        project_id,
        definitions,
        Arc::clone(&app.state.emitter),
        observer_tx,
    );

    if let Err(e) = app.state.register_session(project_id, handle).await {
        warn!("Ignoring start: {}", e);
        return false;
    }

    let state = Arc::clone(&app.state);
    let project = project_id.to_string();
    tokio::spawn(async move {
        session.run().await;
        state.remove_session(&project).await;
    });
    true
}
