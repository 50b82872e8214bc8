//! Source file loading
//!
//! Sources are bounded newline-delimited files, loaded fully into
//! memory before pacing begins (the total-duration policy needs the row
//! count up front). One stream performs exactly one pass over the rows.

use crate::error::{Error, Result};
use std::path::Path;

/// Load a tabular source end-to-end and split it into rows.
///
/// Preserves row order, trims trailing whitespace per row, and performs
/// no content validation. An empty file yields an empty vec. Failure to
/// open or read is fatal to the calling stream's task only.
pub async fn load(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::SourceUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    Ok(content.lines().map(|line| line.trim_end().to_string()).collect())
}
