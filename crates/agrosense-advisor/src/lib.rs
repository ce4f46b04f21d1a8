//! agrosense-advisor — model-backed fertilizer advice.
//!
//! Wraps an OpenAI-compatible chat-completion endpoint behind the
//! [`ChatBackend`] trait, renders the dosage and analysis prompts, parses
//! the free-text replies, and falls back to the formula dosage whenever the
//! model is unreachable or its reply is unusable.

pub mod audit;
pub mod client;
pub mod error;
pub mod parse;
pub mod prompt;
pub mod service;

// Re-export commonly used types
pub use audit::AuditEntry;
pub use client::{ChatBackend, ChatMessage, ChatReply, ChatRequest, OpenAiCompatibleClient};
pub use error::AdvisorError;
pub use parse::SoilAnalysis;
pub use service::{AdviceSource, AdvisorQuery, AdvisorReport, AdvisorService};
