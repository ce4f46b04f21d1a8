//! HTTP handlers for all API routes.

pub mod advisor;
pub mod data;
pub mod recommendation;
pub mod system;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use agrosense_common::ApiError;

/// Decode a JSON request body. Any failure, malformed JSON or missing
/// fields alike, maps to the uniform `Invalid request body` response.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| {
        tracing::debug!("rejecting request body: {}", err);
        ApiError::InvalidBody
    })
}
