//! Shared helpers for integration tests

use async_trait::async_trait;
use feedloop_common::models::StreamDefinition;
use feedloop_engine::error::{Error, Result};
use feedloop_engine::playback::Emitter;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Emitter that records publishes instead of touching the network
pub struct RecordingEmitter {
    pub sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    #[allow(dead_code)]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent_on_channel(&self, channel: &str) -> usize {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(c, _)| c == channel)
            .count()
    }
}

#[async_trait]
impl Emitter for RecordingEmitter {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Delivery {
                channel: channel.to_string(),
                reason: "bus down".to_string(),
            });
        }
        self.sent
            .lock()
            .await
            .push((channel.to_string(), payload.to_string()));
        Ok(())
    }
}

/// Write a newline-delimited source file with one entry per row
pub fn write_source(rows: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

/// Stream definition builder for tests
pub fn stream_def(
    stream_id: &str,
    channel: &str,
    source: PathBuf,
    policy: &str,
    value: Option<f64>,
) -> StreamDefinition {
    StreamDefinition {
        stream_id: stream_id.to_string(),
        project_id: "p1".to_string(),
        channel: channel.to_string(),
        source_path: source,
        policy: policy.to_string(),
        policy_value: value,
        description: None,
        created_at: None,
    }
}
