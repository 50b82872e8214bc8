//! Shared progress aggregation
//!
//! One aggregator instance is owned by each session and updated
//! concurrently by that session's stream tasks. The aggregator performs
//! no I/O; the session decides when to push a snapshot to the observer.

use tokio::sync::RwLock;

/// Completion percentage for one stream within a session
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEntry {
    pub stream_id: String,
    /// Completion percentage in [0, 100]
    pub percentage: f64,
}

/// Thread-safe map of stream identity to completion percentage.
///
/// Entries keep the insertion order of each stream's first update.
/// A stream's percentage never decreases within one run.
#[derive(Debug, Default)]
pub struct ProgressAggregator {
    entries: RwLock<Vec<ProgressEntry>>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one stream's percentage (clamped to [0, 100]).
    ///
    /// Updates below the stream's current percentage are ignored so that
    /// progress is monotonically non-decreasing.
    pub async fn update(&self, stream_id: &str, percentage: f64) {
        let percentage = percentage.clamp(0.0, 100.0);
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|e| e.stream_id == stream_id) {
            Some(entry) => {
                if percentage > entry.percentage {
                    entry.percentage = percentage;
                }
            }
            None => entries.push(ProgressEntry {
                stream_id: stream_id.to_string(),
                percentage,
            }),
        }
    }

    /// Consistent point-in-time copy, in insertion order of first update
    pub async fn snapshot(&self) -> Vec<ProgressEntry> {
        self.entries.read().await.clone()
    }

    /// Drop one stream's entry (cancelled task)
    pub async fn remove(&self, stream_id: &str) {
        self.entries.write().await.retain(|e| e.stream_id != stream_id);
    }

    /// Drop all entries (session stopped or completed)
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
