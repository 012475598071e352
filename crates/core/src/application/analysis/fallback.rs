// Deterministic keyword fallback used when the AI provider is unavailable.

use crate::domain::analysis::{truncate_chars, FALLBACK_SUMMARY, MAX_SKILLS, MAX_TAGS, SUMMARY_MAX_CHARS};
use crate::domain::{AnalysisResult, TicketCategory, TicketPriority};

/// Urgency/severity keywords -> high priority
const HIGH_PRIORITY_KEYWORDS: &[&str] = &[
    "urgent",
    "critical",
    "emergency",
    "down",
    "outage",
    "crash",
    "data loss",
    "security",
    "breach",
    "asap",
    "immediately",
    "broken",
];

/// Question/request keywords -> low priority
const LOW_PRIORITY_KEYWORDS: &[&str] = &[
    "how to",
    "question",
    "request",
    "feature",
    "suggestion",
    "when",
    "would like",
    "wondering",
];

/// Fixed keyword -> (category, tag/skill) dictionary
const TAG_DICTIONARY: &[(&str, TicketCategory, &str)] = &[
    ("payment", TicketCategory::Billing, "billing"),
    ("billing", TicketCategory::Billing, "billing"),
    ("invoice", TicketCategory::Billing, "billing"),
    ("refund", TicketCategory::Billing, "billing"),
    ("login", TicketCategory::Account, "account"),
    ("password", TicketCategory::Account, "account"),
    ("account", TicketCategory::Account, "account"),
    ("2fa", TicketCategory::Account, "account"),
    ("error", TicketCategory::Bug, "bug"),
    ("bug", TicketCategory::Bug, "bug"),
    ("crash", TicketCategory::Bug, "bug"),
    ("exception", TicketCategory::Bug, "bug"),
    ("api", TicketCategory::Technical, "technical"),
    ("integration", TicketCategory::Technical, "technical"),
    ("webhook", TicketCategory::Technical, "technical"),
    ("feature", TicketCategory::FeatureRequest, "feature_request"),
    ("suggestion", TicketCategory::FeatureRequest, "feature_request"),
    ("improve", TicketCategory::FeatureRequest, "feature_request"),
];

/// Build an analysis result from subject+description keywords alone.
/// Deterministic: the same inputs always produce the same result.
pub fn analyze_offline(subject: &str, description: &str, user_category: &str) -> AnalysisResult {
    let text = format!("{} {}", subject, description).to_lowercase();

    let priority = if HIGH_PRIORITY_KEYWORDS.iter().any(|k| text.contains(k)) {
        TicketPriority::High
    } else if LOW_PRIORITY_KEYWORDS.iter().any(|k| text.contains(k)) {
        TicketPriority::Low
    } else {
        TicketPriority::Medium
    };

    let mut category = None;
    let mut tags = Vec::new();
    for (keyword, cat, tag) in TAG_DICTIONARY {
        if text.contains(keyword) {
            if category.is_none() {
                category = Some(*cat);
            }
            if !tags.contains(&tag.to_string()) && tags.len() < MAX_TAGS {
                tags.push(tag.to_string());
            }
        }
    }

    // Dictionary hit wins; otherwise trust the user-supplied category
    let category = category.unwrap_or_else(|| {
        let parsed = TicketCategory::parse_or_other(user_category);
        if parsed == TicketCategory::Other {
            TicketCategory::General
        } else {
            parsed
        }
    });

    // Skills mirror the derived tags (bounded)
    let required_skills = tags.iter().take(MAX_SKILLS).cloned().collect();

    let summary = summarize(description);

    AnalysisResult {
        category,
        priority,
        summary,
        tags,
        required_skills,
    }
}

/// First sentence of the description, bounded; stock string when empty.
fn summarize(description: &str) -> String {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return FALLBACK_SUMMARY.to_string();
    }
    let first_sentence = trimmed
        .split_inclusive(['.', '!', '?'])
        .next()
        .unwrap_or(trimmed);
    truncate_chars(first_sentence.trim(), SUMMARY_MAX_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_keywords_yield_high() {
        let result = analyze_offline("Payment failed", "urgent, card declined", "Billing");
        assert_eq!(result.priority, TicketPriority::High);
        assert_eq!(result.category, TicketCategory::Billing);
        assert!(result.tags.contains(&"billing".to_string()));
        assert!(result.required_skills.contains(&"billing".to_string()));
    }

    #[test]
    fn test_question_keywords_yield_low() {
        let result = analyze_offline("Question", "how to export my data?", "General");
        assert_eq!(result.priority, TicketPriority::Low);
    }

    #[test]
    fn test_neutral_text_yields_medium() {
        let result = analyze_offline("Invoice copy", "please resend my invoice", "Billing");
        assert_eq!(result.priority, TicketPriority::Medium);
        assert_eq!(result.category, TicketCategory::Billing);
    }

    #[test]
    fn test_unknown_text_falls_back_to_user_category() {
        let result = analyze_offline("Hello", "just saying hi", "technical");
        assert_eq!(result.category, TicketCategory::Technical);
        assert!(result.tags.is_empty());
        assert!(result.required_skills.is_empty());
    }

    #[test]
    fn test_unknown_everything_yields_general() {
        let result = analyze_offline("Hello", "just saying hi", "something weird");
        assert_eq!(result.category, TicketCategory::General);
    }

    #[test]
    fn test_summary_is_first_sentence() {
        let result = analyze_offline("S", "The app crashed. Then it crashed again.", "");
        assert_eq!(result.summary, "The app crashed.");
    }

    #[test]
    fn test_empty_description_gets_stock_summary() {
        let result = analyze_offline("S", "   ", "");
        assert_eq!(result.summary, FALLBACK_SUMMARY);
    }

    #[test]
    fn test_deterministic() {
        let a = analyze_offline("Payment failed", "urgent, card declined", "Billing");
        let b = analyze_offline("Payment failed", "urgent, card declined", "Billing");
        assert_eq!(a, b);
    }
}
