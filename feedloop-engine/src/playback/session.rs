//! Playback session coordination
//!
//! One session per project run. The session owns the cancellation flag
//! and the progress aggregator, spawns one task per stream, forwards
//! aggregated snapshots to the observer after every row-send, and ends
//! with exactly one terminal notice.

use crate::playback::emitter::Emitter;
use crate::playback::progress::ProgressAggregator;
use crate::playback::task::{StreamPlaybackTask, TaskEvent, TaskOutcome};
use feedloop_common::events::{ObserverMessage, SessionStatus};
use feedloop_common::models::StreamDefinition;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Control handle for a running session, held by the session registry.
///
/// Dropping the handle does not stop the session; only an explicit
/// `stop` (or observer disconnect) does.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    cancel: watch::Sender<bool>,
}

impl SessionHandle {
    /// Set the shared cancellation flag; all child tasks observe it
    /// between row emissions (and inside their inter-row sleep).
    pub fn stop(&self) {
        let _ = self.cancel.send(true);
    }
}

/// One in-progress playback run for a project
pub struct PlaybackSession {
    project_id: String,
    definitions: Vec<StreamDefinition>,
    emitter: Arc<dyn Emitter>,
    observer: mpsc::Sender<ObserverMessage>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl PlaybackSession {
    /// Create a session together with its control handle.
    ///
    /// The observer channel is borrowed: the session writes to it but
    /// never manages the underlying connection.
    pub fn new(
        project_id: impl Into<String>,
        definitions: Vec<StreamDefinition>,
        emitter: Arc<dyn Emitter>,
        observer: mpsc::Sender<ObserverMessage>,
    ) -> (Self, SessionHandle) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = SessionHandle {
            cancel: cancel_tx.clone(),
        };
        (
            Self {
                project_id: project_id.into(),
                definitions,
                emitter,
                observer,
                cancel_tx,
                cancel_rx,
            },
            handle,
        )
    }

    /// Run the session to completion.
    ///
    /// Returns the terminal status that was sent to the observer.
    pub async fn run(mut self) -> SessionStatus {
        let project_id = self.project_id.clone();
        let definitions = std::mem::take(&mut self.definitions);

        if definitions.is_empty() {
            info!("No streams found for project {}", project_id);
            let _ = self
                .observer
                .send(ObserverMessage::terminal(SessionStatus::NoStreams, &project_id))
                .await;
            return SessionStatus::NoStreams;
        }

        info!(
            "Starting session for project {} with {} streams",
            project_id,
            definitions.len()
        );

        let progress = Arc::new(ProgressAggregator::new());
        let (events_tx, mut events_rx) = mpsc::channel::<TaskEvent>(256);

        let mut tasks = JoinSet::new();
        for definition in definitions {
            let task = StreamPlaybackTask::new(
                definition,
                Arc::clone(&self.emitter),
                Arc::clone(&progress),
                self.cancel_rx.clone(),
                events_tx.clone(),
            );
            tasks.spawn(task.run());
        }
        // Tasks hold the remaining senders; the event loop ends when the
        // last task drops its clone
        drop(events_tx);

        while let Some(event) = events_rx.recv().await {
            match event {
                TaskEvent::RowCount { stream_id, rows } => {
                    debug!("Stream {} reports {} rows", stream_id, rows);
                    self.forward(ObserverMessage::row_count(rows)).await;
                }
                TaskEvent::RowSent { .. } => {
                    let snapshot = progress
                        .snapshot()
                        .await
                        .into_iter()
                        .map(|entry| (entry.stream_id, entry.percentage));
                    self.forward(ObserverMessage::progress(snapshot)).await;
                }
                TaskEvent::Finished { stream_id, outcome } => {
                    if outcome == TaskOutcome::Failed {
                        warn!("Stream {} failed; sibling streams continue", stream_id);
                    }
                }
            }
        }

        while tasks.join_next().await.is_some() {}

        progress.clear().await;

        let status = if *self.cancel_rx.borrow() {
            SessionStatus::Stopped
        } else {
            SessionStatus::Completed
        };
        info!("Session for project {} closed: {:?}", project_id, status);
        let _ = self
            .observer
            .send(ObserverMessage::terminal(status, &project_id))
            .await;
        status
    }

    /// Push one message to the observer; a closed observer channel is an
    /// implicit stop request.
    async fn forward(&self, message: ObserverMessage) {
        if self.observer.send(message).await.is_err() {
            debug!(
                "Observer for project {} disconnected, stopping session",
                self.project_id
            );
            let _ = self.cancel_tx.send(true);
        }
    }
}
