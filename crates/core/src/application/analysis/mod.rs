// Analysis Client - validate-or-fallback boundary over the AI provider
//
// Two-layer defense: a successful upstream response is validated
// field-by-field (AnalysisResult::from_raw); any upstream failure is
// replaced by the deterministic keyword fallback. The pipeline therefore
// always receives a structurally valid result.

pub mod fallback;

use crate::domain::AnalysisResult;
use crate::port::AnalysisProvider;
use std::sync::Arc;
use tracing::{debug, warn};

/// Capability wrapping the external AI provider. Never fails outward.
pub struct AnalysisClient {
    provider: Arc<dyn AnalysisProvider>,
}

impl AnalysisClient {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self { provider }
    }

    /// Classify a ticket. Infallible by contract: upstream errors are
    /// absorbed and replaced by the keyword fallback.
    pub async fn analyze(
        &self,
        subject: &str,
        description: &str,
        user_category: &str,
    ) -> AnalysisResult {
        match self.provider.analyze(subject, description, user_category).await {
            Ok(raw) => {
                let result = AnalysisResult::from_raw(&raw);
                debug!(
                    category = %result.category,
                    priority = %result.priority,
                    "AI analysis succeeded"
                );
                result
            }
            Err(e) => {
                warn!(error = %e, "AI provider failed, using keyword fallback");
                fallback::analyze_offline(subject, description, user_category)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TicketCategory, TicketPriority};
    use crate::port::analysis_provider::mocks::MockAnalysisProvider;
    use serde_json::json;

    #[tokio::test]
    async fn test_valid_response_passes_validation() {
        let provider = Arc::new(MockAnalysisProvider::new_responding(json!({
            "category": "billing",
            "priority": "high",
            "summary": "Payment is failing",
            "tags": ["billing"],
            "required_skills": ["billing"]
        })));
        let client = AnalysisClient::new(provider);

        let result = client.analyze("Payment failed", "card declined", "Billing").await;
        assert_eq!(result.category, TicketCategory::Billing);
        assert_eq!(result.priority, TicketPriority::High);
    }

    #[tokio::test]
    async fn test_malformed_response_is_coerced_not_propagated() {
        let provider = Arc::new(MockAnalysisProvider::new_responding(json!({
            "category": 42,
            "priority": ["not", "a", "string"],
            "tags": "oops"
        })));
        let client = AnalysisClient::new(provider);

        let result = client.analyze("Subject", "Description", "General").await;
        assert_eq!(result.category, TicketCategory::Other);
        assert_eq!(result.priority, TicketPriority::Medium);
        assert!(!result.summary.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_triggers_fallback() {
        let provider = Arc::new(MockAnalysisProvider::new_failing("connection refused"));
        let client = AnalysisClient::new(provider);

        let result = client
            .analyze("Payment failed", "urgent, card declined", "Billing")
            .await;
        // Keyword "urgent" drives the fallback priority
        assert_eq!(result.priority, TicketPriority::High);
        assert!(!result.summary.is_empty());
    }
}
