//! Wire messages exchanged with observers and the message bus
//!
//! Observer messages are pushed over the engine's WebSocket endpoint;
//! commands arrive on the same connection. Field names follow the wire
//! contract consumed by the web UI, hence the camelCase renames.

use serde::{Deserialize, Serialize};

/// Per-stream progress as transmitted to observers
///
/// Percentage is string-formatted to two decimals on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProgress {
    pub percentage: String,
    #[serde(rename = "streamId")]
    pub stream_id: String,
}

/// Terminal status of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// All streams reached a terminal state without an explicit stop
    Completed,
    /// Session was stopped by the observer (or by observer disconnect)
    Stopped,
    /// The requested project has no stream definitions
    NoStreams,
    /// The session could not be started (e.g. record store unavailable)
    Error,
}

/// Messages pushed to an observer connection
///
/// The three shapes are structurally distinct, so the enum is untagged
/// on the wire:
/// - `{"numberOfLines": 42}` once per stream before any progress
/// - `{"streams": [{"percentage": "50.00", "streamId": "..."}]}` per row-send
/// - `{"status": "completed", "projectId": "..."}` once per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObserverMessage {
    RowCount {
        #[serde(rename = "numberOfLines")]
        number_of_lines: usize,
    },
    Progress {
        streams: Vec<StreamProgress>,
    },
    Terminal {
        status: SessionStatus,
        #[serde(rename = "projectId")]
        project_id: String,
    },
}

impl ObserverMessage {
    /// Row-count notice for one stream, sent before its first progress update
    pub fn row_count(number_of_lines: usize) -> Self {
        Self::RowCount { number_of_lines }
    }

    /// Aggregated progress snapshot from (stream id, percentage) pairs
    pub fn progress<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self::Progress {
            streams: entries
                .into_iter()
                .map(|(stream_id, pct)| StreamProgress {
                    percentage: format!("{:.2}", pct),
                    stream_id,
                })
                .collect(),
        }
    }

    /// Terminal notice carrying the project identity
    pub fn terminal(status: SessionStatus, project_id: impl Into<String>) -> Self {
        Self::Terminal {
            status,
            project_id: project_id.into(),
        }
    }
}

/// Commands received from an observer connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ObserverCommand {
    /// Begin playback for all streams of a project
    Start {
        #[serde(rename = "projectId")]
        project_id: String,
    },
    /// Stop the active session for a project
    Stop {
        #[serde(rename = "projectId")]
        project_id: String,
    },
}

/// Envelope published to the message bus, one per source row
///
/// The raw row content always travels under the `payload` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusEnvelope {
    pub channel: String,
    pub payload: String,
}
