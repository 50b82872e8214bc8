//! Per-stream playback task
//!
//! One tokio task per stream: load the source, pace rows per the
//! stream's policy, publish each row to the bus, update the shared
//! aggregator, and watch the session's cancellation flag between rows.
//! The inter-row sleep itself is raced against the flag so stop latency
//! is bounded by one scheduling tick rather than the full interval.

use crate::playback::emitter::Emitter;
use crate::playback::policy::PlaybackPolicy;
use crate::playback::progress::ProgressAggregator;
use crate::playback::source;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use feedloop_common::models::StreamDefinition;

/// Terminal state of one stream's playback, reported exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// All rows processed; final percentage pinned at 100.0
    Completed,
    /// Cancellation flag observed; no further rows emitted
    Cancelled,
    /// Source unavailable or policy invalid; siblings unaffected
    Failed,
}

/// Events a task reports to its owning session
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// Sent once per stream after the source is loaded, before any progress
    RowCount { stream_id: String, rows: usize },

    /// One row was published (or a delivery failure was absorbed),
    /// carrying the stream's percentage as of that row
    RowSent { stream_id: String, percentage: f64 },

    /// Terminal state reached
    Finished {
        stream_id: String,
        outcome: TaskOutcome,
    },
}

/// The per-stream control loop
pub struct StreamPlaybackTask {
    definition: StreamDefinition,
    emitter: Arc<dyn Emitter>,
    progress: Arc<ProgressAggregator>,
    cancel: watch::Receiver<bool>,
    events: mpsc::Sender<TaskEvent>,
}

impl StreamPlaybackTask {
    pub fn new(
        definition: StreamDefinition,
        emitter: Arc<dyn Emitter>,
        progress: Arc<ProgressAggregator>,
        cancel: watch::Receiver<bool>,
        events: mpsc::Sender<TaskEvent>,
    ) -> Self {
        Self {
            definition,
            emitter,
            progress,
            cancel,
            events,
        }
    }

    /// Run the stream to a terminal state and report it to the session.
    pub async fn run(mut self) {
        let stream_id = self.definition.stream_id.clone();
        let outcome = self.play().await;
        info!("Stream {} finished: {:?}", stream_id, outcome);
        let _ = self
            .events
            .send(TaskEvent::Finished { stream_id, outcome })
            .await;
    }

    async fn play(&mut self) -> TaskOutcome {
        let stream_id = self.definition.stream_id.clone();

        // Policy problems are configuration errors, rejected before any
        // row is read
        let policy = match PlaybackPolicy::from_definition(&self.definition) {
            Ok(policy) => policy,
            Err(e) => {
                error!("Stream {} failed to start: {}", stream_id, e);
                return TaskOutcome::Failed;
            }
        };

        let rows = match source::load(&self.definition.source_path).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Stream {} failed to load source: {}", stream_id, e);
                return TaskOutcome::Failed;
            }
        };

        let total = rows.len();
        info!(
            "Stream {} loaded {} rows for channel {}",
            stream_id, total, self.definition.channel
        );
        let _ = self
            .events
            .send(TaskEvent::RowCount {
                stream_id: stream_id.clone(),
                rows: total,
            })
            .await;

        if total == 0 {
            self.progress.update(&stream_id, 100.0).await;
            let _ = self
                .events
                .send(TaskEvent::RowSent {
                    stream_id: stream_id.clone(),
                    percentage: 100.0,
                })
                .await;
            return TaskOutcome::Completed;
        }

        let interval = policy.interval(total);

        for (index, row) in rows.iter().enumerate() {
            if *self.cancel.borrow() {
                return self.cancelled(&stream_id).await;
            }

            // Delivery failures are absorbed: the row still counts as
            // sent for progress purposes
            if let Err(e) = self.emitter.publish(&self.definition.channel, row).await {
                warn!("Stream {} delivery failure (continuing): {}", stream_id, e);
            }

            let sent = index + 1;
            let percentage = if sent == total {
                100.0
            } else {
                sent as f64 / total as f64 * 100.0
            };
            self.progress.update(&stream_id, percentage).await;
            let _ = self
                .events
                .send(TaskEvent::RowSent {
                    stream_id: stream_id.clone(),
                    percentage,
                })
                .await;

            // No sleep after the final row
            if sent < total && !interval.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    changed = self.cancel.changed() => {
                        // A dropped sender means the session is gone;
                        // treat it the same as a stop
                        if changed.is_err() || *self.cancel.borrow() {
                            return self.cancelled(&stream_id).await;
                        }
                    }
                }
            }
        }

        TaskOutcome::Completed
    }

    async fn cancelled(&self, stream_id: &str) -> TaskOutcome {
        self.progress.remove(stream_id).await;
        TaskOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::io::Write;
    use std::path::PathBuf;
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    /// Emitter that records publishes (with timestamps) instead of
    /// touching the network
    struct RecordingEmitter {
        sent: Mutex<Vec<(String, String, Instant)>>,
        fail: bool,
    }

    impl RecordingEmitter {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
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
                .push((channel.to_string(), payload.to_string(), Instant::now()));
            Ok(())
        }
    }

    fn write_source(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file
    }

    fn def(source: PathBuf, policy: &str, value: Option<f64>) -> StreamDefinition {
        StreamDefinition {
            stream_id: "s1".to_string(),
            project_id: "p1".to_string(),
            channel: "ticks".to_string(),
            source_path: source,
            policy: policy.to_string(),
            policy_value: value,
            description: None,
            created_at: None,
        }
    }

    struct Harness {
        emitter: Arc<RecordingEmitter>,
        progress: Arc<ProgressAggregator>,
        cancel_tx: watch::Sender<bool>,
        events_rx: mpsc::Receiver<TaskEvent>,
    }

    fn spawn_task(definition: StreamDefinition, emitter: Arc<RecordingEmitter>) -> Harness {
        let progress = Arc::new(ProgressAggregator::new());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::channel(1024);

        let task = StreamPlaybackTask::new(
            definition,
            emitter.clone() as Arc<dyn Emitter>,
            Arc::clone(&progress),
            cancel_rx,
            events_tx,
        );
        tokio::spawn(task.run());

        Harness {
            emitter,
            progress,
            cancel_tx,
            events_rx,
        }
    }

    async fn drain_until_finished(harness: &mut Harness) -> (Vec<TaskEvent>, TaskOutcome) {
        let mut events = Vec::new();
        while let Some(event) = harness.events_rx.recv().await {
            let finished = matches!(event, TaskEvent::Finished { .. });
            events.push(event);
            if finished {
                break;
            }
        }
        let outcome = match events.last() {
            Some(TaskEvent::Finished { outcome, .. }) => *outcome,
            other => panic!("expected Finished event, got {:?}", other),
        };
        (events, outcome)
    }

    #[tokio::test(start_paused = true)]
    async fn emits_all_rows_in_order_and_reaches_100() {
        let file = write_source(&["r1", "r2", "r3"]);
        let mut harness = spawn_task(
            def(file.path().to_path_buf(), "rows_per_second", Some(10.0)),
            Arc::new(RecordingEmitter::new()),
        );

        let (events, outcome) = drain_until_finished(&mut harness).await;
        assert_eq!(outcome, TaskOutcome::Completed);

        assert!(matches!(events[0], TaskEvent::RowCount { rows: 3, .. }));
        let row_sends = events
            .iter()
            .filter(|e| matches!(e, TaskEvent::RowSent { .. }))
            .count();
        assert_eq!(row_sends, 3);

        let sent = harness.emitter.sent.lock().await;
        let payloads: Vec<&str> = sent.iter().map(|(_, p, _)| p.as_str()).collect();
        assert_eq!(payloads, vec!["r1", "r2", "r3"]);
        assert!(sent.iter().all(|(c, _, _)| c == "ticks"));

        assert_eq!(harness.progress.snapshot().await[0].percentage, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn rows_per_second_spaces_rows_evenly() {
        let file = write_source(&["r1", "r2", "r3"]);
        let mut harness = spawn_task(
            def(file.path().to_path_buf(), "rows_per_second", Some(10.0)),
            Arc::new(RecordingEmitter::new()),
        );
        drain_until_finished(&mut harness).await;

        let sent = harness.emitter.sent.lock().await;
        // (N-1) inter-row delays of 1000/rate ms under the paused clock
        assert_eq!(sent[1].2 - sent[0].2, std::time::Duration::from_millis(100));
        assert_eq!(sent[2].2 - sent[1].2, std::time::Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn total_duration_spans_the_configured_seconds() {
        let rows: Vec<String> = (0..10).map(|i| format!("row{}", i)).collect();
        let row_refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        let file = write_source(&row_refs);
        let mut harness = spawn_task(
            def(file.path().to_path_buf(), "total_duration", Some(2.0)),
            Arc::new(RecordingEmitter::new()),
        );
        drain_until_finished(&mut harness).await;

        let sent = harness.emitter.sent.lock().await;
        // 9 inter-row delays of 200ms each: first-to-last span is 1.8s,
        // independent of the row count granularity
        let span = sent[9].2 - sent[0].2;
        assert_eq!(span, std::time::Duration::from_millis(1800));
    }

    #[tokio::test(start_paused = true)]
    async fn real_time_inserts_no_delay() {
        let file = write_source(&["r1", "r2", "r3", "r4", "r5"]);
        let start = Instant::now();
        let mut harness = spawn_task(
            def(file.path().to_path_buf(), "real_time", None),
            Arc::new(RecordingEmitter::new()),
        );
        let (_, outcome) = drain_until_finished(&mut harness).await;
        assert_eq!(outcome, TaskOutcome::Completed);

        let sent = harness.emitter.sent.lock().await;
        assert_eq!(sent.len(), 5);
        // Paused clock: any artificial sleep would show up as elapsed time
        assert_eq!(sent[4].2 - start, std::time::Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_monotonic_and_hits_100_once() {
        let file = write_source(&["a", "b", "c", "d"]);
        let mut harness = spawn_task(
            def(file.path().to_path_buf(), "real_time", None),
            Arc::new(RecordingEmitter::new()),
        );

        let mut last = 0.0;
        let mut hundred_count = 0;
        while let Some(event) = harness.events_rx.recv().await {
            match event {
                TaskEvent::RowSent { percentage, .. } => {
                    assert!(percentage >= last);
                    last = percentage;
                    if percentage == 100.0 {
                        hundred_count += 1;
                    }
                }
                TaskEvent::Finished { .. } => break,
                TaskEvent::RowCount { .. } => {}
            }
        }
        assert_eq!(last, 100.0);
        assert_eq!(hundred_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_mid_stream() {
        let rows: Vec<String> = (0..100).map(|i| format!("row{}", i)).collect();
        let row_refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();
        let file = write_source(&row_refs);
        let mut harness = spawn_task(
            def(file.path().to_path_buf(), "rows_per_second", Some(10.0)),
            Arc::new(RecordingEmitter::new()),
        );

        // Let a few rows through, then stop
        let mut sent_count = 0;
        while let Some(event) = harness.events_rx.recv().await {
            if matches!(event, TaskEvent::RowSent { .. }) {
                sent_count += 1;
                if sent_count == 3 {
                    harness.cancel_tx.send(true).unwrap();
                }
            }
            if let TaskEvent::Finished { outcome, .. } = event {
                assert_eq!(outcome, TaskOutcome::Cancelled);
                break;
            }
        }

        // The interruptible sleep bounds overshoot to at most one row
        let sent = harness.emitter.sent.lock().await;
        assert!(sent.len() <= 4, "sent {} rows after stop", sent.len());

        // Cancelled streams drop their progress entry
        assert!(harness.progress.snapshot().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_failures_do_not_halt_playback() {
        let file = write_source(&["a", "b", "c"]);
        let mut harness = spawn_task(
            def(file.path().to_path_buf(), "real_time", None),
            Arc::new(RecordingEmitter::failing()),
        );

        let (events, outcome) = drain_until_finished(&mut harness).await;
        assert_eq!(outcome, TaskOutcome::Completed);

        // Every row counted as sent despite the bus being down
        let row_sends = events
            .iter()
            .filter(|e| matches!(e, TaskEvent::RowSent { .. }))
            .count();
        assert_eq!(row_sends, 3);
        assert_eq!(harness.progress.snapshot().await[0].percentage, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_row_source_completes_immediately_at_100() {
        let file = write_source(&[]);
        let start = Instant::now();
        let mut harness = spawn_task(
            def(file.path().to_path_buf(), "rows_per_second", Some(1.0)),
            Arc::new(RecordingEmitter::new()),
        );

        let (events, outcome) = drain_until_finished(&mut harness).await;
        assert_eq!(outcome, TaskOutcome::Completed);
        assert!(matches!(events[0], TaskEvent::RowCount { rows: 0, .. }));

        let snapshot = harness.progress.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].percentage, 100.0);
        assert_eq!(Instant::now() - start, std::time::Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_policy_fails_before_reading_source() {
        let mut harness = spawn_task(
            // Nonexistent source: must not matter, the policy is checked first
            def(PathBuf::from("/nonexistent/rows.csv"), "rows_per_second", Some(0.0)),
            Arc::new(RecordingEmitter::new()),
        );

        let (events, outcome) = drain_until_finished(&mut harness).await;
        assert_eq!(outcome, TaskOutcome::Failed);
        // No row count, no rows
        assert_eq!(events.len(), 1);
        assert!(harness.emitter.sent.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_source_fails_the_task() {
        let mut harness = spawn_task(
            def(PathBuf::from("/nonexistent/rows.csv"), "real_time", None),
            Arc::new(RecordingEmitter::new()),
        );
        let (_, outcome) = drain_until_finished(&mut harness).await;
        assert_eq!(outcome, TaskOutcome::Failed);
        assert!(harness.progress.snapshot().await.is_empty());
    }
}
