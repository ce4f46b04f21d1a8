//! Advisory orchestration: prompt the model, parse its reply, and fall back
//! to the formula-based dosage whenever the model path cannot deliver.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use agrosense_common::recommend::{fallback_dosage, AdvisoryDosage};

use crate::audit::AuditEntry;
use crate::client::{ChatBackend, ChatMessage, ChatRequest};
use crate::error::AdvisorError;
use crate::parse::{parse_analysis_reply, parse_dosage_reply, DoseReasons, SoilAnalysis};
use crate::prompt::{analysis_prompt, dosage_prompt};

const DOSAGE_MAX_TOKENS: u32 = 600;
const DOSAGE_TEMPERATURE: f32 = 0.3;
const ANALYSIS_MAX_TOKENS: u32 = 300;
const ANALYSIS_TEMPERATURE: f32 = 0.1;

/// Audit entries kept in memory before the oldest are dropped.
const AUDIT_CAPACITY: usize = 200;

// ── Query & report ──────────────────────────────────────────────────────────

/// Soil figures submitted for a model-backed recommendation.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorQuery {
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    #[serde(default)]
    pub context: Option<String>,
}

/// Where the figures in an [`AdvisorReport`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceSource {
    Model,
    Fallback,
}

/// Recommendation returned to clients. Always present, whatever happened on
/// the model path.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisorReport {
    pub source: AdviceSource,
    /// Raw model reply. `None` when the model never answered.
    pub reply: Option<String>,
    pub recommendation: AdvisoryDosage,
    pub reasons: DoseReasons,
    pub tips: String,
    pub timestamp: DateTime<Utc>,
}

impl AdvisorReport {
    /// Formula-based report for when the model was never reached.
    pub fn fallback(ph: f64, nitrogen: f64, potassium: f64) -> Self {
        Self {
            source: AdviceSource::Fallback,
            reply: None,
            recommendation: fallback_dosage(ph, nitrogen, potassium),
            reasons: DoseReasons {
                urea: "Calculated from the estimated nitrogen demand".to_string(),
                sp36: "Calculated from the estimated phosphorus demand".to_string(),
                kcl: "Calculated from the estimated potassium demand".to_string(),
            },
            tips: "The advisory model was unavailable; using the alternative calculation."
                .to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Formula-based report that keeps a reply the parser could not use.
    fn fallback_with_reply(ph: f64, nitrogen: f64, potassium: f64, reply: String) -> Self {
        Self {
            source: AdviceSource::Fallback,
            reply: Some(reply),
            recommendation: fallback_dosage(ph, nitrogen, potassium),
            reasons: DoseReasons {
                urea: "Based on soil nitrogen demand and acidity".to_string(),
                sp36: "Based on phosphorus demand and potassium content".to_string(),
                kcl: "Based on the nutrient balance and crop demand".to_string(),
            },
            tips: "Periodic soil analysis is recommended to track nutrient development."
                .to_string(),
            timestamp: Utc::now(),
        }
    }
}

// ── Service ─────────────────────────────────────────────────────────────────

/// Drives a [`ChatBackend`] and keeps an in-memory audit trail of calls.
pub struct AdvisorService {
    backend: Arc<dyn ChatBackend>,
    audit: RwLock<VecDeque<AuditEntry>>,
}

impl AdvisorService {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            audit: RwLock::new(VecDeque::new()),
        }
    }

    /// Ask the model for a dosage recommendation.
    ///
    /// Never fails: an unreachable backend, an empty reply or an unparsable
    /// reply all degrade to the formula-based fallback, with the outcome
    /// recorded in the audit trail.
    pub async fn recommend(&self, query: &AdvisorQuery) -> AdvisorReport {
        let prompt = dosage_prompt(
            query.ph,
            query.nitrogen,
            query.potassium,
            query.context.as_deref(),
        );
        let request = ChatRequest {
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: DOSAGE_MAX_TOKENS,
            temperature: DOSAGE_TEMPERATURE,
        };

        let started = Instant::now();
        match self.backend.complete(request).await {
            Ok(reply) if !reply.content.trim().is_empty() => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let parsed = parse_dosage_reply(&reply.content);
                if parsed.is_empty() {
                    tracing::warn!(
                        "advisory reply had no parsable dosage, using formula fallback"
                    );
                    self.record(&reply.content, latency_ms, true).await;
                    return AdvisorReport::fallback_with_reply(
                        query.ph,
                        query.nitrogen,
                        query.potassium,
                        reply.content,
                    );
                }

                tracing::info!(
                    "advisory dosage parsed from {} reply in {}ms",
                    self.backend.model_id(),
                    latency_ms
                );
                self.record(&reply.content, latency_ms, false).await;
                AdvisorReport {
                    source: AdviceSource::Model,
                    recommendation: AdvisoryDosage {
                        urea: parsed.urea,
                        sp36: parsed.sp36,
                        kcl: parsed.kcl,
                    },
                    reasons: parsed.reasons,
                    tips: parsed.tips,
                    reply: Some(reply.content),
                    timestamp: Utc::now(),
                }
            }
            Ok(_) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                tracing::warn!("advisory model returned an empty reply, using formula fallback");
                self.record("", latency_ms, true).await;
                AdvisorReport::fallback(query.ph, query.nitrogen, query.potassium)
            }
            Err(err) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                tracing::warn!("advisory call failed: {}, using formula fallback", err);
                self.record("", latency_ms, true).await;
                AdvisorReport::fallback(query.ph, query.nitrogen, query.potassium)
            }
        }
    }

    /// Ask the model to pull pH / N / K figures out of free text.
    ///
    /// Unlike [`recommend`](Self::recommend) there is no formula to fall
    /// back to, so backend and parse failures surface as errors.
    pub async fn analyze(&self, text: &str) -> Result<SoilAnalysis, AdvisorError> {
        let request = ChatRequest {
            messages: vec![ChatMessage::user(analysis_prompt(text))],
            max_tokens: ANALYSIS_MAX_TOKENS,
            temperature: ANALYSIS_TEMPERATURE,
        };

        let started = Instant::now();
        match self.backend.complete(request).await {
            Ok(reply) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                self.record(&reply.content, latency_ms, false).await;
                if reply.content.trim().is_empty() {
                    return Err(AdvisorError::EmptyReply);
                }
                parse_analysis_reply(&reply.content)
            }
            Err(err) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                self.record("", latency_ms, false).await;
                Err(err)
            }
        }
    }

    /// Audit entries, newest first.
    pub async fn recent_audit(&self) -> Vec<AuditEntry> {
        self.audit.read().await.iter().cloned().collect()
    }

    async fn record(&self, reply: &str, latency_ms: u64, fallback: bool) {
        let entry = AuditEntry::new(
            self.backend.model_id().to_string(),
            self.backend.name().to_string(),
            reply,
            latency_ms,
            fallback,
        );
        let mut audit = self.audit.write().await;
        audit.push_front(entry);
        audit.truncate(AUDIT_CAPACITY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ScriptedBackend {
        content: Option<String>,
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn complete(&self, _req: ChatRequest) -> Result<crate::client::ChatReply, AdvisorError> {
            match &self.content {
                Some(content) => Ok(crate::client::ChatReply {
                    content: content.clone(),
                    model: "stub-model".to_string(),
                }),
                None => Err(AdvisorError::Api {
                    status: 500,
                    message: "boom".to_string(),
                }),
            }
        }

        fn model_id(&self) -> &str {
            "stub-model"
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn service_with(content: Option<&str>) -> AdvisorService {
        AdvisorService::new(Arc::new(ScriptedBackend {
            content: content.map(str::to_string),
        }))
    }

    fn query() -> AdvisorQuery {
        AdvisorQuery {
            ph: 6.0,
            nitrogen: 40.0,
            potassium: 30.0,
            context: None,
        }
    }

    #[tokio::test]
    async fn test_recommend_uses_model_reply() {
        let reply = "\
1. Urea (N): 120 g/m²
   Reason: Nitrogen is low.
2. SP-36 (P): 45.5 g/m²
   Reason: Phosphorus is adequate.
3. KCL (K): 60 g/m²
   Reason: Potassium is low.

Additional Tips: Water in the morning.";
        let service = service_with(Some(reply));
        let report = service.recommend(&query()).await;

        assert_eq!(report.source, AdviceSource::Model);
        assert_eq!(report.recommendation.urea, 120.0);
        assert_eq!(report.recommendation.sp36, 45.5);
        assert_eq!(report.recommendation.kcl, 60.0);
        assert_eq!(report.reasons.urea, "Nitrogen is low.");
        assert_eq!(report.tips, "Water in the morning.");
        assert_eq!(report.reply.as_deref(), Some(reply));

        let audit = service.recent_audit().await;
        assert_eq!(audit.len(), 1);
        assert!(!audit[0].fallback);
        assert_eq!(audit[0].model, "stub-model");
        assert_eq!(audit[0].backend, "stub");
    }

    #[tokio::test]
    async fn test_recommend_keeps_unparsable_reply_in_fallback() {
        let service = service_with(Some("I cannot help with that."));
        let report = service.recommend(&query()).await;

        assert_eq!(report.source, AdviceSource::Fallback);
        assert_eq!(report.reply.as_deref(), Some("I cannot help with that."));
        assert_eq!(report.recommendation.urea, 170.0);
        assert_eq!(report.recommendation.sp36, 115.0);
        assert_eq!(report.recommendation.kcl, 110.0);
        assert_eq!(report.reasons.urea, "Based on soil nitrogen demand and acidity");

        let audit = service.recent_audit().await;
        assert_eq!(audit.len(), 1);
        assert!(audit[0].fallback);
    }

    #[tokio::test]
    async fn test_recommend_falls_back_on_backend_error() {
        let service = service_with(None);
        let report = service.recommend(&query()).await;

        assert_eq!(report.source, AdviceSource::Fallback);
        assert_eq!(report.reply, None);
        assert_eq!(report.recommendation.urea, 170.0);
        assert_eq!(
            report.reasons.urea,
            "Calculated from the estimated nitrogen demand"
        );
        assert!(service.recent_audit().await[0].fallback);
    }

    #[tokio::test]
    async fn test_recommend_falls_back_on_empty_reply() {
        let service = service_with(Some("   \n"));
        let report = service.recommend(&query()).await;

        assert_eq!(report.source, AdviceSource::Fallback);
        assert_eq!(report.reply, None);
    }

    #[tokio::test]
    async fn test_analyze_parses_json_reply() {
        let service = service_with(Some(
            "```json\n{\"pH\": 6.2, \"N\": 35, \"K\": 28, \"analysis\": \"Slightly acidic.\"}\n```",
        ));
        let analysis = service.analyze("dark loam").await.unwrap();

        assert_eq!(analysis.ph, 6.2);
        assert_eq!(analysis.nitrogen, 35.0);
        assert_eq!(analysis.potassium, 28.0);
        assert_eq!(analysis.analysis, "Slightly acidic.");
    }

    #[tokio::test]
    async fn test_analyze_rejects_unparsable_reply() {
        let service = service_with(Some("pH is probably around six"));
        let err = service.analyze("dark loam").await.unwrap_err();
        assert!(matches!(err, AdvisorError::UnparsableReply));
        assert_eq!(service.recent_audit().await.len(), 1);
    }

    #[tokio::test]
    async fn test_audit_is_newest_first() {
        let service = service_with(Some("no structure here"));
        service.recommend(&query()).await;
        let _ = service.analyze("dark loam").await;

        let audit = service.recent_audit().await;
        assert_eq!(audit.len(), 2);
        assert!(!audit[0].fallback, "analyze entry is newest");
        assert!(audit[1].fallback, "recommend entry fell back");
    }
}
