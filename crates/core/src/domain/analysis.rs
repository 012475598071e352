// AI Analysis Domain Model
//
// The upstream provider returns arbitrary JSON. `RawAnalysis` holds that
// loose shape; `AnalysisResult::from_raw` projects it into the strongly
// typed result, substituting safe defaults field-by-field. Invalid or
// partial upstream data never propagates past this boundary.

use crate::domain::ticket::TicketPriority;
use serde::{Deserialize, Serialize};

/// Maximum summary length in characters
pub const SUMMARY_MAX_CHARS: usize = 500;
/// Maximum number of suggested tags
pub const MAX_TAGS: usize = 5;
/// Maximum number of required skills
pub const MAX_SKILLS: usize = 5;
/// Stock summary used when the upstream summary is empty or missing
pub const FALLBACK_SUMMARY: &str = "No summary available";

/// Fixed category enumeration; anything else coerces to Other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Technical,
    Billing,
    Account,
    FeatureRequest,
    Bug,
    General,
    Other,
}

impl std::fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketCategory::Technical => write!(f, "technical"),
            TicketCategory::Billing => write!(f, "billing"),
            TicketCategory::Account => write!(f, "account"),
            TicketCategory::FeatureRequest => write!(f, "feature_request"),
            TicketCategory::Bug => write!(f, "bug"),
            TicketCategory::General => write!(f, "general"),
            TicketCategory::Other => write!(f, "other"),
        }
    }
}

impl TicketCategory {
    /// Parse a category leniently; unknown values become Other.
    pub fn parse_or_other(s: &str) -> Self {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "technical" => TicketCategory::Technical,
            "billing" => TicketCategory::Billing,
            "account" => TicketCategory::Account,
            "feature_request" => TicketCategory::FeatureRequest,
            "bug" => TicketCategory::Bug,
            "general" => TicketCategory::General,
            _ => TicketCategory::Other,
        }
    }
}

/// Loosely typed upstream response (arbitrary JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAnalysis(serde_json::Value);

impl RawAnalysis {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Structured classification of a ticket.
///
/// Always well-formed: category in the fixed enum, priority in
/// {low, medium, high}, summary non-empty and bounded, lists bounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub summary: String,
    pub tags: Vec<String>,
    pub required_skills: Vec<String>,
}

impl AnalysisResult {
    /// Project a raw upstream response into a valid result.
    ///
    /// Per-field rules: unknown category -> Other, unknown priority ->
    /// medium, summary truncated to its bound (stock string when empty),
    /// tag/skill lists truncated to their bounds with non-string entries
    /// dropped, skills lowercased.
    pub fn from_raw(raw: &RawAnalysis) -> Self {
        let v = raw.as_value();

        let category = v
            .get("category")
            .and_then(|c| c.as_str())
            .map(TicketCategory::parse_or_other)
            .unwrap_or(TicketCategory::Other);

        let priority = v
            .get("priority")
            .and_then(|p| p.as_str())
            .map(TicketPriority::parse_or_default)
            .unwrap_or_default();

        let summary = match v.get("summary").and_then(|s| s.as_str()) {
            Some(s) if !s.trim().is_empty() => truncate_chars(s.trim(), SUMMARY_MAX_CHARS),
            _ => FALLBACK_SUMMARY.to_string(),
        };

        let tags = string_list(v.get("tags"), MAX_TAGS, false);
        let required_skills = string_list(v.get("required_skills"), MAX_SKILLS, true);

        Self {
            category,
            priority,
            summary,
            tags,
            required_skills,
        }
    }
}

/// Extract a bounded list of strings from a JSON value, dropping
/// non-string entries.
fn string_list(value: Option<&serde_json::Value>, max: usize, lowercase: bool) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|e| e.as_str())
                .map(|s| {
                    if lowercase {
                        s.trim().to_lowercase()
                    } else {
                        s.trim().to_string()
                    }
                })
                .filter(|s| !s.is_empty())
                .take(max)
                .collect()
        })
        .unwrap_or_default()
}

/// Truncate at a character boundary (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
