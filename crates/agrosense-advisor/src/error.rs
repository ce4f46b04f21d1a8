use agrosense_common::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },

    #[error("Model returned an empty reply")]
    EmptyReply,

    #[error("Model reply did not contain a parsable JSON object")]
    UnparsableReply,
}

/// Advisory failures surface as upstream errors where no fallback applies.
impl From<AdvisorError> for ApiError {
    fn from(err: AdvisorError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}
