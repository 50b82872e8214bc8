//! Errors raised by the shared record-store layer

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures opening or preparing the shared sqlite store
#[derive(Error, Debug)]
pub enum Error {
    /// Record store could not be opened, migrated, or queried
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure while preparing the database location
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
