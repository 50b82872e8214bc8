//! Record models shared between the engine and the management services
//!
//! The engine treats these as read-only input; create/update/delete of
//! stream records belongs to the management layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Policy kind strings as stored in the `streams.policy` column
pub const POLICY_ROWS_PER_SECOND: &str = "rows_per_second";
pub const POLICY_TOTAL_DURATION: &str = "total_duration";
pub const POLICY_REAL_TIME: &str = "real_time";

/// One configured source-to-channel playback definition within a project
///
/// `policy` and `policy_value` are stored verbatim; the engine validates
/// them when a playback task starts so that a bad record fails only its
/// own stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDefinition {
    /// Stream identity (opaque string, unique per record)
    pub stream_id: String,

    /// Owning project identity
    pub project_id: String,

    /// Destination channel name on the message bus
    pub channel: String,

    /// Location of the tabular source file
    pub source_path: PathBuf,

    /// Playback policy selector (`rows_per_second`, `total_duration`, `real_time`)
    pub policy: String,

    /// Numeric policy parameter (rows/sec or total seconds; absent for real_time)
    pub policy_value: Option<f64>,

    /// Free-form description, not consumed by the engine
    pub description: Option<String>,

    /// Record creation timestamp, not consumed by the engine
    pub created_at: Option<DateTime<Utc>>,
}
