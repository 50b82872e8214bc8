//! Shared engine state
//!
//! Holds the record-store pool, the bus emitter, and the registry of
//! active sessions keyed by project identity. The registry is the only
//! cross-connection state; per-session progress lives inside each
//! session's own aggregator.

use crate::error::{Error, Result};
use crate::playback::emitter::Emitter;
use crate::playback::session::SessionHandle;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// State shared across all API handlers and sessions
pub struct SharedState {
    /// Stream-definition store (read-only from the engine's side)
    pub db: SqlitePool,

    /// Bus emitter shared by all sessions
    pub emitter: Arc<dyn Emitter>,

    /// Active sessions by project identity
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SharedState {
    pub fn new(db: SqlitePool, emitter: Arc<dyn Emitter>) -> Self {
        Self {
            db,
            emitter,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a session for a project; at most one per project.
    pub async fn register_session(&self, project_id: &str, handle: SessionHandle) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(project_id) {
            return Err(Error::Session(format!(
                "Session already active for project {}",
                project_id
            )));
        }
        sessions.insert(project_id.to_string(), handle);
        Ok(())
    }

    /// Set the cancellation flag of a project's active session.
    ///
    /// Returns false when no session is active for the project.
    pub async fn stop_session(&self, project_id: &str) -> bool {
        match self.sessions.read().await.get(project_id) {
            Some(handle) => {
                info!("Stop requested for project {}", project_id);
                handle.stop();
                true
            }
            None => false,
        }
    }

    /// Remove a session from the registry once it has closed.
    pub async fn remove_session(&self, project_id: &str) {
        self.sessions.write().await.remove(project_id);
    }

    /// Project identities with an active session, for the status API
    pub async fn active_projects(&self) -> Vec<String> {
        let mut projects: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        projects.sort();
        projects
    }
}
