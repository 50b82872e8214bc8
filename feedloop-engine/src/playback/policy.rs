//! Playback pacing policies
//!
//! Each stream carries exactly one policy describing how fast its rows
//! are emitted. The per-row interval is constant for a given run and is
//! computed once, after the source is fully loaded.

use crate::error::{Error, Result};
use feedloop_common::models::{
    StreamDefinition, POLICY_REAL_TIME, POLICY_ROWS_PER_SECOND, POLICY_TOTAL_DURATION,
};
use std::time::Duration;

/// Pacing rule governing inter-row delay for one stream's replay
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackPolicy {
    /// Emit exactly `rate` rows per second, evenly spaced
    RowsPerSecond(f64),

    /// Spread all rows evenly across the given number of seconds
    TotalDuration(f64),

    /// No artificial delay between rows
    RealTime,
}

impl PlaybackPolicy {
    /// Parse and validate the policy stored on a stream record.
    ///
    /// Zero, negative, or missing numeric parameters (and unknown policy
    /// names) are configuration errors, rejected before playback starts.
    pub fn from_definition(def: &StreamDefinition) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPolicy {
            stream_id: def.stream_id.clone(),
            reason,
        };

        match def.policy.as_str() {
            POLICY_ROWS_PER_SECOND => match def.policy_value {
                Some(rate) if rate > 0.0 && rate.is_finite() => {
                    // The implied delay must fit in a Duration
                    Duration::try_from_secs_f64(1.0 / rate)
                        .map_err(|_| invalid(format!("rows per second {} is out of range", rate)))?;
                    Ok(Self::RowsPerSecond(rate))
                }
                Some(rate) => Err(invalid(format!("rows per second must be positive, got {}", rate))),
                None => Err(invalid("rows per second requires a value".to_string())),
            },
            POLICY_TOTAL_DURATION => match def.policy_value {
                Some(seconds) if seconds > 0.0 => {
                    Duration::try_from_secs_f64(seconds)
                        .map_err(|_| invalid(format!("total duration {} is out of range", seconds)))?;
                    Ok(Self::TotalDuration(seconds))
                }
                Some(seconds) => {
                    Err(invalid(format!("total duration must be positive, got {}", seconds)))
                }
                None => Err(invalid("total duration requires a value".to_string())),
            },
            POLICY_REAL_TIME => Ok(Self::RealTime),
            other => Err(invalid(format!("unknown policy '{}'", other))),
        }
    }

    /// Constant per-row delay for a source of `total_rows` rows.
    ///
    /// Zero rows means there is nothing to pace; the task completes
    /// immediately.
    pub fn interval(&self, total_rows: usize) -> Duration {
        match self {
            Self::RowsPerSecond(rate) => {
                Duration::try_from_secs_f64(1.0 / rate).unwrap_or(Duration::MAX)
            }
            Self::TotalDuration(seconds) => {
                if total_rows == 0 {
                    Duration::ZERO
                } else {
                    Duration::try_from_secs_f64(seconds / total_rows as f64)
                        .unwrap_or(Duration::MAX)
                }
            }
            Self::RealTime => Duration::ZERO,
        }
    }
}
