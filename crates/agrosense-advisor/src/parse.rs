//! Extraction of structured data from free-form model replies.
//!
//! Dosage replies are matched line by line against the layout requested in
//! [`crate::prompt::dosage_prompt`]. Analysis replies are scanned for the
//! first balanced JSON object, which tolerates code fences and surrounding
//! prose.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

/// Per-fertilizer explanations pulled from the reply's `Reason:` lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoseReasons {
    pub urea: String,
    pub sp36: String,
    pub kcl: String,
}

/// Dosage figures and prose extracted from a model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDosage {
    pub urea: f64,
    pub sp36: f64,
    pub kcl: f64,
    pub reasons: DoseReasons,
    pub tips: String,
}

impl ParsedDosage {
    /// True when no dosage figure was found at all. Callers treat this as a
    /// failed parse and fall back to the formula-based recommendation.
    pub fn is_empty(&self) -> bool {
        self.urea == 0.0 && self.sp36 == 0.0 && self.kcl == 0.0
    }
}

/// Soil figures extracted from an analysis reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilAnalysis {
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub analysis: String,
}

// ── Reply patterns ──────────────────────────────────────────────────────────

struct ReplyPatterns {
    urea_amount: Regex,
    sp36_amount: Regex,
    kcl_amount: Regex,
    urea_reason: Regex,
    sp36_reason: Regex,
    kcl_reason: Regex,
    tips: Regex,
    leading_number: Regex,
}

fn patterns() -> &'static ReplyPatterns {
    static PATTERNS: OnceLock<ReplyPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ReplyPatterns {
        // Amounts must sit on the same line as the fertilizer name.
        urea_amount: Regex::new(r"(?i)urea.*?(\d+(?:\.\d+)?)\s*g/m²").unwrap(),
        sp36_amount: Regex::new(r"(?i)sp-?36.*?(\d+(?:\.\d+)?)\s*g/m²").unwrap(),
        kcl_amount: Regex::new(r"(?i)kcl.*?(\d+(?:\.\d+)?)\s*g/m²").unwrap(),
        // Reasons run until the next numbered item, the tips line, or the end
        // of the reply.
        urea_reason: Regex::new(
            r"(?is)urea.*?reason:\s*(.*?)(?:\n\s*\d\.|\n\s*additional tips|\z)",
        )
        .unwrap(),
        sp36_reason: Regex::new(
            r"(?is)sp-?36.*?reason:\s*(.*?)(?:\n\s*\d\.|\n\s*additional tips|\z)",
        )
        .unwrap(),
        kcl_reason: Regex::new(
            r"(?is)kcl.*?reason:\s*(.*?)(?:\n\s*\d\.|\n\s*additional tips|\z)",
        )
        .unwrap(),
        tips: Regex::new(r"(?i)(?:additional tips|tips):\s*([^\n]+)").unwrap(),
        leading_number: Regex::new(r"^\d+\.\s*").unwrap(),
    })
}

fn capture_amount(re: &Regex, reply: &str) -> f64 {
    re.captures(reply)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

fn capture_reason(re: &Regex, reply: &str) -> String {
    let raw = re
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or("");
    patterns().leading_number.replace(raw, "").into_owned()
}

/// Pull dosage figures, reasons and tips out of a dosage reply.
///
/// Never fails; anything the reply does not provide comes back zero or
/// empty, and [`ParsedDosage::is_empty`] reports a reply with no usable
/// figures.
pub fn parse_dosage_reply(reply: &str) -> ParsedDosage {
    let p = patterns();
    ParsedDosage {
        urea: capture_amount(&p.urea_amount, reply),
        sp36: capture_amount(&p.sp36_amount, reply),
        kcl: capture_amount(&p.kcl_amount, reply),
        reasons: DoseReasons {
            urea: capture_reason(&p.urea_reason, reply),
            sp36: capture_reason(&p.sp36_reason, reply),
            kcl: capture_reason(&p.kcl_reason, reply),
        },
        tips: p
            .tips
            .captures(reply)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
    }
}

// ── JSON extraction ─────────────────────────────────────────────────────────

/// Slice out the first balanced `{ ... }` object in `text`.
///
/// Tracks string literals and escapes so braces inside JSON strings do not
/// unbalance the scan. Returns `None` when no complete object is present.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if start.is_some() => in_string = true,
            b'{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if start.is_some() => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start?..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse an analysis reply into [`SoilAnalysis`].
pub fn parse_analysis_reply(reply: &str) -> Result<SoilAnalysis, AdvisorError> {
    let object = extract_json_object(reply).ok_or(AdvisorError::UnparsableReply)?;
    serde_json::from_str(object).map_err(|_| AdvisorError::UnparsableReply)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL_REPLY: &str = "\
1. Urea (N): 120 g/m²
   Reason: Nitrogen is below the optimal range for leaf growth.
2. SP-36 (P): 45.5 g/m²
   Reason: Phosphorus supports early root development.
3. KCL (K): 60 g/m²
   Reason: Potassium strengthens stems and disease resistance.

Additional Tips: Water regularly and split the urea into two applications.

Detailed Analysis: The soil is mildly acidic with moderate fertility.";

    #[test]
    fn test_parse_canonical_reply() {
        let parsed = parse_dosage_reply(CANONICAL_REPLY);
        assert_eq!(parsed.urea, 120.0);
        assert_eq!(parsed.sp36, 45.5);
        assert_eq!(parsed.kcl, 60.0);
        assert_eq!(
            parsed.reasons.urea,
            "Nitrogen is below the optimal range for leaf growth."
        );
        assert_eq!(
            parsed.reasons.sp36,
            "Phosphorus supports early root development."
        );
        assert_eq!(
            parsed.reasons.kcl,
            "Potassium strengthens stems and disease resistance."
        );
        assert_eq!(
            parsed.tips,
            "Water regularly and split the urea into two applications."
        );
        assert!(!parsed.is_empty());
    }

    #[test]
    fn test_parse_tolerates_markdown_decoration() {
        let reply = "\
**1. Urea (N)**: 120 g/m²
   Reason: Needs more nitrogen.
**2. SP-36 (P)**: 45 g/m²
   Reason: Phosphorus is adequate.
**3. KCL (K)**: 60 g/m²
   Reason: Potassium is low.";
        let parsed = parse_dosage_reply(reply);
        assert_eq!(parsed.urea, 120.0);
        assert_eq!(parsed.sp36, 45.0);
        assert_eq!(parsed.kcl, 60.0);
        assert_eq!(parsed.reasons.kcl, "Potassium is low.");
    }

    #[test]
    fn test_parse_multiline_reason_stops_at_next_item() {
        let reply = "\
1. Urea (N): 100 g/m²
   Reason: Nitrogen is low.
   Apply in the morning.
2. SP-36 (P): 50 g/m²
   Reason: Standard dose.";
        let parsed = parse_dosage_reply(reply);
        assert_eq!(
            parsed.reasons.urea,
            "Nitrogen is low.\n   Apply in the morning."
        );
        assert_eq!(parsed.reasons.sp36, "Standard dose.");
    }

    #[test]
    fn test_parse_strips_leading_numbering_from_reason() {
        let reply = "1. Urea (N): 100 g/m²\n   Reason: 1. Dose for sandy soil.";
        let parsed = parse_dosage_reply(reply);
        assert_eq!(parsed.reasons.urea, "Dose for sandy soil.");
    }

    #[test]
    fn test_parse_short_tips_label() {
        let reply = "1. Urea (N): 80 g/m²\nTips: Mulch after fertilizing.";
        let parsed = parse_dosage_reply(reply);
        assert_eq!(parsed.tips, "Mulch after fertilizing.");
    }

    #[test]
    fn test_parse_unstructured_reply_is_empty() {
        let parsed = parse_dosage_reply("The soil looks fine, no fertilizer needed.");
        assert!(parsed.is_empty());
        assert_eq!(parsed, ParsedDosage::default());
    }

    #[test]
    fn test_parse_partial_reply_is_not_empty() {
        let parsed = parse_dosage_reply("Urea only: 30 g/m² should do.");
        assert_eq!(parsed.urea, 30.0);
        assert_eq!(parsed.sp36, 0.0);
        assert!(!parsed.is_empty());
    }

    #[test]
    fn test_extract_json_object_from_fenced_block() {
        let reply = "Here you go:\n```json\n{\"pH\": 6.5, \"N\": 40, \"K\": 30, \"analysis\": \"balanced {mostly}\"}\n```";
        let object = extract_json_object(reply).unwrap();
        assert!(object.starts_with('{'));
        assert!(object.ends_with('}'));
        assert!(object.contains("balanced {mostly}"));
    }

    #[test]
    fn test_extract_json_object_handles_nesting() {
        let reply = "prefix {\"a\": {\"b\": 1}, \"c\": \"x\"} suffix";
        assert_eq!(
            extract_json_object(reply),
            Some("{\"a\": {\"b\": 1}, \"c\": \"x\"}")
        );
    }

    #[test]
    fn test_extract_json_object_rejects_prose() {
        assert_eq!(extract_json_object("no braces here"), None);
        assert_eq!(extract_json_object("unbalanced { forever"), None);
    }

    #[test]
    fn test_parse_analysis_reply() {
        let reply = "Sure:\n{\"pH\": 6.2, \"N\": 35, \"K\": 28, \"analysis\": \"Slightly acidic soil.\"}";
        let analysis = parse_analysis_reply(reply).unwrap();
        assert_eq!(analysis.ph, 6.2);
        assert_eq!(analysis.nitrogen, 35.0);
        assert_eq!(analysis.potassium, 28.0);
        assert_eq!(analysis.analysis, "Slightly acidic soil.");
    }

    #[test]
    fn test_parse_analysis_reply_rejects_bad_json() {
        let err = parse_analysis_reply("pH is probably around six").unwrap_err();
        assert!(matches!(err, AdvisorError::UnparsableReply));

        let err = parse_analysis_reply("{\"pH\": \"six\"}").unwrap_err();
        assert!(matches!(err, AdvisorError::UnparsableReply));
    }
}
