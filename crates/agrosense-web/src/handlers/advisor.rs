//! Model-backed advisory endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use agrosense_advisor::{AdvisorQuery, AdvisorReport, AuditEntry, SoilAnalysis};
use agrosense_common::ApiError;

use crate::handlers::parse_body;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// Model-backed dosage recommendation. Always answers 200: with no advisor
/// configured (or a failing one) the formula fallback fills in.
pub async fn advisor_recommend(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<AdvisorReport>, ApiError> {
    let query: AdvisorQuery = parse_body(&body)?;
    let report = match &state.advisor {
        Some(service) => service.recommend(&query).await,
        None => AdvisorReport::fallback(query.ph, query.nitrogen, query.potassium),
    };
    Ok(Json(report))
}

/// Extract pH / N / K figures from free soil text. Needs a configured
/// advisor; there is no formula to fall back to.
pub async fn advisor_analyze(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<SoilAnalysis>, ApiError> {
    let request: AnalyzeRequest = parse_body(&body)?;
    let service = state
        .advisor
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Advisor backend not configured".to_string()))?;
    let analysis = service.analyze(&request.text).await?;
    Ok(Json(analysis))
}

/// Advisory call audit trail, newest first. Empty when no advisor is
/// configured.
pub async fn advisor_audit(State(state): State<SharedState>) -> Json<Vec<AuditEntry>> {
    let entries = match &state.advisor {
        Some(service) => service.recent_audit().await,
        None => Vec::new(),
    };
    Json(entries)
}
