//! Audit records for advisory model calls.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One advisory call. The reply itself is not stored, only its SHA-256, so
/// the trail stays small and free of prompt content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub model: String,
    pub backend: String,
    pub reply_sha256: String,
    pub latency_ms: u64,
    pub fallback: bool,
    pub called_at: chrono::DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        model: String,
        backend: String,
        reply: &str,
        latency_ms: u64,
        fallback: bool,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(reply.as_bytes());
        let reply_sha256 = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            model,
            backend,
            reply_sha256,
            latency_ms,
            fallback,
            called_at: Utc::now(),
        }
    }
}
