//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::db;
use crate::state::AppState;

/// Liveness: the process is up and serving.
///
/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: the session database answers.
///
/// The data service is not probed; pages degrade on their own when it is down.
///
/// GET /health/ready
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if db::is_ready(state.pool()).await {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}
