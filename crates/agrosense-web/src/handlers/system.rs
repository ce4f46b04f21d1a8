//! Health and status endpoints.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::state::SharedState;

pub async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let readings = state.store.raw_count().await;
    Json(json!({
        "status": "ok",
        "version": state.version,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "readings": readings,
    }))
}
