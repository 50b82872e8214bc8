//! # Feedloop Playback Engine (feedloop-engine)
//!
//! Replays tabular file data onto a message bus at controlled rates.
//!
//! **Purpose:** Load stream definitions for a project, replay each
//! stream's source file row-by-row onto its bus channel according to its
//! playback policy, and push live aggregated progress to the observer
//! that started the session.
//!
//! **Architecture:** One tokio task per stream, coordinated by a
//! per-project session that owns the cancellation flag and the observer
//! connection. HTTP/WebSocket control surface built on axum.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
