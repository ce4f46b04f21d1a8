//! Axum router — maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use agrosense_common::ApiError;

use crate::handlers::{
    advisor::{advisor_analyze, advisor_audit, advisor_recommend},
    data::{
        calibrated_clear, calibrated_current, calibrated_delete, calibrated_history,
        calibrated_latest_stored, calibrated_store, history_all, raw_clear, raw_current,
        raw_delete, raw_history, raw_store,
    },
    recommendation::{recommend_dosage, recommendation_history},
    system::health,
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        // System
        .route("/api/health", get(health))

        // Sensor data
        .route(
            "/api/data/raw",
            get(raw_current).post(raw_store).delete(raw_clear),
        )
        .route("/api/data/raw/history", get(raw_history))
        .route("/api/data/raw/{id}", delete(raw_delete))
        .route(
            "/api/data/calibrated",
            get(calibrated_current)
                .post(calibrated_store)
                .delete(calibrated_clear),
        )
        .route("/api/data/calibrated/history", get(calibrated_history))
        .route("/api/data/calibrated/{id}", delete(calibrated_delete))
        .route("/api/latest/calibrated", get(calibrated_latest_stored))
        .route("/api/history", get(history_all))

        // Recommendations
        .route("/api/recommendation", post(recommend_dosage))
        .route("/api/recommendation/history", get(recommendation_history))

        // Advisory model
        .route("/api/advisor/recommendation", post(advisor_recommend))
        .route("/api/advisor/analyze", post(advisor_analyze))
        .route("/api/advisor/audit", get(advisor_audit))

        // Uniform JSON errors for unknown paths and wrong methods
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
