// Ticket Repository Port (Interface)

use crate::domain::{Ticket, TicketId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface over ticket storage, as consumed by the pipeline.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Find ticket by ID
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>>;

    /// Persist the AI-derived fields (category, priority, summary, tags)
    /// plus the possibly-escalated stored priority from the entity.
    async fn update_ai_fields(&self, ticket: &Ticket) -> Result<()>;

    /// Atomically assign the ticket: set assignee, assignment
    /// timestamp/actor, status in_progress, and response time (first
    /// assignment only).
    ///
    /// Returns `false` without touching anything when the ticket already
    /// has an assignee, which makes re-executed runs idempotent.
    async fn assign(
        &self,
        id: &TicketId,
        assignee_id: &str,
        assigned_by: &str,
        now_millis: i64,
    ) -> Result<bool>;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory ticket store with optional failure injection
    pub struct MockTicketRepository {
        tickets: Mutex<HashMap<TicketId, Ticket>>,
        fail_with: Mutex<Option<String>>,
    }

    impl Default for MockTicketRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTicketRepository {
        pub fn new() -> Self {
            Self {
                tickets: Mutex::new(HashMap::new()),
                fail_with: Mutex::new(None),
            }
        }

        pub fn insert(&self, ticket: Ticket) {
            self.tickets
                .lock()
                .unwrap()
                .insert(ticket.id.clone(), ticket);
        }

        /// Make every subsequent call fail with a database error
        pub fn fail_with(&self, message: impl Into<String>) {
            *self.fail_with.lock().unwrap() = Some(message.into());
        }

        pub fn get(&self, id: &str) -> Option<Ticket> {
            self.tickets.lock().unwrap().get(id).cloned()
        }

        fn check_failure(&self) -> Result<()> {
            if let Some(msg) = self.fail_with.lock().unwrap().clone() {
                return Err(AppError::Database(msg));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TicketRepository for MockTicketRepository {
        async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>> {
            self.check_failure()?;
            Ok(self.tickets.lock().unwrap().get(id).cloned())
        }

        async fn update_ai_fields(&self, ticket: &Ticket) -> Result<()> {
            self.check_failure()?;
            let mut tickets = self.tickets.lock().unwrap();
            let stored = tickets
                .get_mut(&ticket.id)
                .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", ticket.id)))?;
            stored.ai_category = ticket.ai_category.clone();
            stored.ai_priority = ticket.ai_priority;
            stored.ai_summary = ticket.ai_summary.clone();
            stored.ai_tags = ticket.ai_tags.clone();
            stored.priority = ticket.priority;
            stored.updated_at = ticket.updated_at;
            Ok(())
        }

        async fn assign(
            &self,
            id: &TicketId,
            assignee_id: &str,
            assigned_by: &str,
            now_millis: i64,
        ) -> Result<bool> {
            self.check_failure()?;
            let mut tickets = self.tickets.lock().unwrap();
            let stored = tickets
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", id)))?;
            if stored.assignee_id.is_some() {
                return Ok(false);
            }
            stored.assign(assignee_id, assigned_by, now_millis);
            Ok(true)
        }
    }
}
