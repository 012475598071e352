// Mailer Port
// Abstraction over the outbound email collaborator.

use async_trait::async_trait;
use thiserror::Error;

/// A rendered outbound email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail delivery errors (absorbed by the NotificationDispatcher)
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Message rejected by provider: {0}")]
    Rejected(String),
}

/// Mailer trait
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a single email.
    ///
    /// # Errors
    /// - `MailError::Transport` on network problems
    /// - `MailError::Rejected` when the provider refuses the message
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Records sent mail; optionally rejects everything.
    pub struct MockMailer {
        sent: Mutex<Vec<Email>>,
        reject: AtomicBool,
    }

    impl Default for MockMailer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockMailer {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                reject: AtomicBool::new(false),
            }
        }

        /// Make every subsequent send fail
        pub fn reject_all(&self) {
            self.reject.store(true, Ordering::SeqCst);
        }

        pub fn sent(&self) -> Vec<Email> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, email: &Email) -> Result<(), MailError> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(MailError::Rejected("mock rejection".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }
}
