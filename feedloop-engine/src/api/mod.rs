//! HTTP/WebSocket control surface for the playback engine

pub mod ws;

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Engine shared state (record store, emitter, session registry)
    pub state: Arc<SharedState>,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))
        // API v1 routes
        .nest(
            "/api/v1",
            Router::new()
                // Observer connection: start/stop commands in, progress out
                .route("/ws", get(ws::ws_handler))
                // Active sessions by project identity
                .route("/sessions", get(list_sessions)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "feedloop-engine",
        "version": env!("CARGO_PKG_VERSION"),
        "port": app.port,
    }))
}

/// List project identities with an active playback session
async fn list_sessions(State(app): State<AppState>) -> Json<serde_json::Value> {
    let projects = app.state.active_projects().await;
    Json(json!({ "sessions": projects }))
}
