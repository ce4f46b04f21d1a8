//! Raw and calibrated sensor reading endpoints.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use agrosense_common::{calibration, ApiError, NewReading, SensorReading, StoredReading};

use crate::handlers::parse_body;
use crate::state::SharedState;

const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

impl HistoryParams {
    pub(crate) fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT)
    }
}

// === Raw readings ===

pub async fn raw_current(
    State(state): State<SharedState>,
) -> Result<Json<StoredReading>, ApiError> {
    let reading = state.store.latest_raw().await.ok_or(ApiError::NotFound)?;
    Ok(Json(reading))
}

pub async fn raw_store(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<StoredReading>, ApiError> {
    let incoming: NewReading = parse_body(&body)?;
    let reading = SensorReading {
        timestamp: incoming.timestamp.unwrap_or_else(Utc::now),
        variables: incoming.variables,
    };
    let stored = state.store.insert_raw(reading).await;
    tracing::info!("stored raw reading {}", stored.id);
    Ok(Json(stored))
}

pub async fn raw_history(
    State(state): State<SharedState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<StoredReading>> {
    Json(state.store.raw_history(params.limit()).await)
}

pub async fn raw_delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<StoredReading>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;
    let removed = state.store.remove_raw(id).await.ok_or(ApiError::NotFound)?;
    Ok(Json(removed))
}

pub async fn raw_clear(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let deleted = state.store.clear_raw().await;
    tracing::info!("cleared {} raw readings", deleted);
    Json(json!({ "deleted": deleted }))
}

// === Calibrated readings ===

/// Calibrated view of the newest raw reading. Nothing is stored; the
/// calibration factors are applied on the way out.
pub async fn calibrated_current(
    State(state): State<SharedState>,
) -> Result<Json<SensorReading>, ApiError> {
    let raw = state.store.latest_raw().await.ok_or(ApiError::NotFound)?;
    Ok(Json(SensorReading {
        timestamp: raw.timestamp,
        variables: calibration::calibrate(&raw.variables),
    }))
}

/// Store a reading the caller has already calibrated, as given.
pub async fn calibrated_store(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<StoredReading>, ApiError> {
    let incoming: NewReading = parse_body(&body)?;
    let reading = SensorReading {
        timestamp: incoming.timestamp.unwrap_or_else(Utc::now),
        variables: incoming.variables,
    };
    let stored = state.store.insert_calibrated(reading).await;
    tracing::info!("stored calibrated reading {}", stored.id);
    Ok(Json(stored))
}

pub async fn calibrated_history(
    State(state): State<SharedState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<StoredReading>> {
    Json(state.store.calibrated_history(params.limit()).await)
}

pub async fn calibrated_delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<StoredReading>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;
    let removed = state
        .store
        .remove_calibrated(id)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(Json(removed))
}

pub async fn calibrated_clear(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let deleted = state.store.clear_calibrated().await;
    tracing::info!("cleared {} calibrated readings", deleted);
    Json(json!({ "deleted": deleted }))
}

/// Newest stored calibrated reading, or, when none has been stored yet, a
/// calibrated view of the newest raw reading under its own timestamp.
pub async fn calibrated_latest_stored(
    State(state): State<SharedState>,
) -> Result<Response, ApiError> {
    if let Some(stored) = state.store.latest_calibrated().await {
        return Ok(Json(stored).into_response());
    }

    let raw = state.store.latest_raw().await.ok_or(ApiError::NotFound)?;
    let view = SensorReading {
        timestamp: raw.timestamp,
        variables: calibration::calibrate(&raw.variables),
    };
    Ok(Json(view).into_response())
}

// === Combined history ===

/// Every raw reading on record, newest first.
pub async fn history_all(State(state): State<SharedState>) -> Json<Vec<StoredReading>> {
    Json(state.store.all_raw().await)
}
