//! Formula-based NPK dosage endpoints.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;

use agrosense_common::recommend::DoseRequest;
use agrosense_common::store::DoseRecord;
use agrosense_common::ApiError;

use crate::handlers::data::HistoryParams;
use crate::handlers::parse_body;
use crate::state::SharedState;

pub async fn recommend_dosage(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<DoseRecord>, ApiError> {
    let request: DoseRequest = parse_body(&body)?;
    let record = DoseRecord {
        input: request,
        recommendation: request.dosage(),
        timestamp: Utc::now(),
    };
    state.store.push_dose(record).await;
    tracing::info!(
        "dosage recommendation: urea {}g, sp36 {}g, kcl {}g",
        record.recommendation.urea,
        record.recommendation.sp36,
        record.recommendation.kcl
    );
    Ok(Json(record))
}

pub async fn recommendation_history(
    State(state): State<SharedState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<DoseRecord>> {
    Json(state.store.dose_history(params.limit()).await)
}
