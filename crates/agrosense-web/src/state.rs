//! Shared application state for the web server.

use std::sync::Arc;
use std::time::Instant;

use secrecy::SecretString;

use agrosense_advisor::{AdvisorService, OpenAiCompatibleClient};
use agrosense_common::HistoryStore;

use crate::config::Config;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub store: HistoryStore,
    /// `None` when no API key is configured. Advisory recommendations then
    /// degrade to the formula fallback and analysis answers 503.
    pub advisor: Option<Arc<AdvisorService>>,
    pub started_at: Instant,
    pub version: &'static str,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: HistoryStore::with_mock_readings(),
            advisor: build_advisor(config),
            started_at: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

fn build_advisor(config: &Config) -> Option<Arc<AdvisorService>> {
    let key = std::env::var(&config.advisor.api_key_env).unwrap_or_default();
    if key.trim().is_empty() {
        tracing::warn!(
            "advisor disabled: no API key found (set {} to enable model-backed recommendations)",
            config.advisor.api_key_env
        );
        return None;
    }

    let client = OpenAiCompatibleClient::new(
        config.advisor.base_url.clone(),
        config.advisor.model.clone(),
        SecretString::from(key),
    )
    .with_attribution(config.advisor.referer.clone(), config.advisor.title.clone());

    tracing::info!(
        "advisor enabled: {} via {}",
        config.advisor.model,
        config.advisor.base_url
    );
    Some(Arc::new(AdvisorService::new(Arc::new(client))))
}

pub type SharedState = Arc<AppState>;
