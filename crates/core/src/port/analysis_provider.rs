// Analysis Provider Port
// Abstraction over the external AI text-analysis collaborator.
// This is the raw, fallible call; the AnalysisClient layer above it
// absorbs every error into a fallback result.

use crate::domain::RawAnalysis;
use async_trait::async_trait;
use thiserror::Error;

/// Provider errors (all absorbed by the AnalysisClient)
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider returned status {0}: {1}")]
    Status(u16, String),

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// AI analysis provider trait
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Ask the provider to classify a ticket.
    ///
    /// # Errors
    /// - `ProviderError::Transport` on network problems
    /// - `ProviderError::Status` on non-success HTTP status
    /// - `ProviderError::Malformed` when the response cannot be parsed
    async fn analyze(
        &self,
        subject: &str,
        description: &str,
        user_category: &str,
    ) -> Result<RawAnalysis, ProviderError>;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock provider behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Return this JSON value as the raw analysis
        Respond(serde_json::Value),
        /// Fail with a transport error
        Fail(String),
    }

    /// Mock analysis provider for testing
    pub struct MockAnalysisProvider {
        behavior: Arc<Mutex<MockBehavior>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockAnalysisProvider {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn new_responding(value: serde_json::Value) -> Self {
            Self::new(MockBehavior::Respond(value))
        }

        pub fn new_failing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl AnalysisProvider for MockAnalysisProvider {
        async fn analyze(
            &self,
            _subject: &str,
            _description: &str,
            _user_category: &str,
        ) -> Result<RawAnalysis, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockBehavior::Respond(value) => Ok(RawAnalysis::new(value)),
                MockBehavior::Fail(msg) => Err(ProviderError::Transport(msg)),
            }
        }
    }
}
