//! Health check endpoints for container orchestration.
//!
//! `/health` is a liveness check that only proves the process answers HTTP.
//! `/health/ready` also asks the store for its document count, so it fails
//! while the database is unreachable.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Liveness check.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness check reporting the backend and current record count.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let backend = state.store.backend_name();
    match state.store.count().await {
        Ok(records) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "backend": backend, "records": records })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "backend": backend })),
            )
        }
    }
}
