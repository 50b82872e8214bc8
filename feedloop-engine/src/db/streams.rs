//! Stream definition queries

use crate::error::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use feedloop_common::models::StreamDefinition;
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;

/// Load all stream definitions belonging to a project, in record order.
///
/// Returns an empty vec for an unknown project; the session layer turns
/// that into a "no streams" notice.
pub async fn get_streams_for_project(
    db: &SqlitePool,
    project_id: &str,
) -> Result<Vec<StreamDefinition>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, project_guid, channel, source_path, policy, policy_value,
               description, created_at
        FROM streams
        WHERE project_guid = ?
        ORDER BY rowid
        "#,
    )
    .bind(project_id)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| StreamDefinition {
            stream_id: row.get("guid"),
            project_id: row.get("project_guid"),
            channel: row.get("channel"),
            source_path: PathBuf::from(row.get::<String, _>("source_path")),
            policy: row.get("policy"),
            policy_value: row.get("policy_value"),
            description: row.get("description"),
            created_at: parse_timestamp(row.get::<Option<String>, _>("created_at")),
        })
        .collect())
}

/// Parse sqlite's `datetime('now')` text format; other shapes resolve
/// to None rather than failing the whole query.
fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
