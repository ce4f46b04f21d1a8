//! Chat-completion client.
//!
//! The concrete client targets OpenRouter in production but works against
//! any OpenAI-compatible `/chat/completions` endpoint. The service and the
//! handlers depend only on [`ChatBackend`], so tests substitute a scripted
//! backend.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

// ── Request / Reply ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub model: String,
}

// ── Trait ────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, req: ChatRequest) -> Result<ChatReply, AdvisorError>;
    fn model_id(&self) -> &str;
    /// Short backend label for audit entries.
    fn name(&self) -> &str;
}

// ── Helpers ──────────────────────────────────────────────────────────────────

async fn check_response_status(
    resp: reqwest::Response,
) -> Result<serde_json::Value, AdvisorError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let message = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(AdvisorError::Api { status, message });
    }
    Ok(body)
}

// ── OpenAI-compatible client (OpenRouter, LMStudio, vLLM, …) ─────────────────

pub struct OpenAiCompatibleClient {
    base_url: String,
    model: String,
    api_key: SecretString,
    referer: Option<String>,
    title: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key,
            referer: None,
            title: None,
            client: reqwest::Client::new(),
        }
    }

    /// Attribution headers some gateways (OpenRouter) use for app ranking.
    pub fn with_attribution(mut self, referer: Option<String>, title: Option<String>) -> Self {
        self.referer = referer;
        self.title = title;
        self
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatibleClient {
    async fn complete(&self, req: ChatRequest) -> Result<ChatReply, AdvisorError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model":       &self.model,
            "messages":    req.messages,
            "max_tokens":  req.max_tokens,
            "temperature": req.temperature,
        });

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body);
        if let Some(ref referer) = self.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(ref title) = self.title {
            request = request.header("X-Title", title);
        }

        let resp = request.send().await?;
        let json = check_response_status(resp).await?;

        Ok(ChatReply {
            content: json["choices"][0]["message"]["content"]
                .as_str()
                .unwrap_or("")
                .to_string(),
            model: json["model"].as_str().unwrap_or(&self.model).to_string(),
        })
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "openai_compatible"
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_exposes_model_id() {
        let client = OpenAiCompatibleClient::new(
            "https://openrouter.ai/api/v1",
            "z-ai/glm-4.5-air:free",
            SecretString::from("sk-or-test"),
        );
        assert_eq!(client.model_id(), "z-ai/glm-4.5-air:free");
        assert_eq!(client.name(), "openai_compatible");
    }

    #[test]
    fn test_attribution_headers_are_optional() {
        let client = OpenAiCompatibleClient::new(
            "http://localhost:1234/v1",
            "local-model",
            SecretString::from("unused"),
        );
        assert!(client.referer.is_none());
        assert!(client.title.is_none());

        let client = client.with_attribution(
            Some("https://example.test".to_string()),
            Some("AgroSense".to_string()),
        );
        assert_eq!(client.referer.as_deref(), Some("https://example.test"));
        assert_eq!(client.title.as_deref(), Some("AgroSense"));
    }

    #[test]
    fn test_user_message_role() {
        let message = ChatMessage::user("hello");
        assert_eq!(message.role, "user");
        assert_eq!(message.content, "hello");
    }
}
