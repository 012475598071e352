// Pipeline Run Domain Model
//
// A run is the durable unit of work behind one ticket-creation event. The
// worker claims pending runs, executes the five-step pipeline, and settles
// the run as done, requeued (retryable failure) or failed (fatal).

use crate::domain::error::{DomainError, Result};
use crate::domain::ticket::{TicketId, TicketPriority};
use serde::{Deserialize, Serialize};

/// Run ID (UUID v4)
pub type RunId = String;

/// Default maximum attempts for a pipeline run
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;
/// Default backoff multiplier between attempts
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// The inbound `ticket/created` trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCreatedEvent {
    pub ticket_id: TicketId,
    pub subject: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
    pub user_id: String,
    pub user_email: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Pending,
    Running,
    Done,
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Pending => write!(f, "PENDING"),
            RunState::Running => write!(f, "RUNNING"),
            RunState::Done => write!(f, "DONE"),
            RunState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Durable pipeline run record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: RunId,
    pub ticket_id: TicketId,
    pub event: TicketCreatedEvent,
    pub state: RunState,

    pub attempts: i32,
    pub max_attempts: i32,
    pub backoff_factor: f64,

    pub created_at: i64, // epoch ms
    /// Earliest time the run may be claimed (moved forward on retry)
    pub scheduled_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub last_error: Option<String>,
}

impl PipelineRun {
    /// Create a pending run for a ticket-creation event.
    ///
    /// `id` and `created_at` are injected, not generated, so creation is
    /// deterministic under test.
    pub fn new(id: impl Into<String>, event: TicketCreatedEvent, created_at: i64) -> Self {
        Self {
            id: id.into(),
            ticket_id: event.ticket_id.clone(),
            event,
            state: RunState::Pending,
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            created_at,
            scheduled_at: created_at,
            started_at: None,
            finished_at: None,
            last_error: None,
        }
    }

    /// Transition to Running with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        if self.state != RunState::Pending {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: RunState::Running.to_string(),
            });
        }
        self.state = RunState::Running;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Done with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        if self.state != RunState::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: RunState::Done.to_string(),
            });
        }
        self.state = RunState::Done;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Failed (fatal error or retries exhausted)
    pub fn fail(&mut self, now_millis: i64, error: impl Into<String>) {
        self.state = RunState::Failed;
        self.finished_at = Some(now_millis);
        self.last_error = Some(error.into());
    }

    /// Put the run back in the queue for a later attempt.
    pub fn requeue(&mut self, not_before_millis: i64, error: impl Into<String>) {
        self.attempts += 1;
        self.state = RunState::Pending;
        self.started_at = None;
        self.scheduled_at = not_before_millis;
        self.last_error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> TicketCreatedEvent {
        TicketCreatedEvent {
            ticket_id: "t-1".to_string(),
            subject: "Help".to_string(),
            description: "Something broke".to_string(),
            category: "Technical".to_string(),
            priority: TicketPriority::Medium,
            user_id: "user-1".to_string(),
            user_email: "user@example.com".to_string(),
            user_name: "User".to_string(),
        }
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = PipelineRun::new("run-1", sample_event(), 1_000);
        assert_eq!(run.state, RunState::Pending);

        run.start(2_000).unwrap();
        assert_eq!(run.state, RunState::Running);
        assert_eq!(run.started_at, Some(2_000));

        run.complete(3_000).unwrap();
        assert_eq!(run.state, RunState::Done);
        assert_eq!(run.finished_at, Some(3_000));
    }

    #[test]
    fn test_cannot_start_non_pending_run() {
        let mut run = PipelineRun::new("run-1", sample_event(), 1_000);
        run.start(2_000).unwrap();
        assert!(run.start(3_000).is_err());
    }

    #[test]
    fn test_requeue_increments_attempts_and_reschedules() {
        let mut run = PipelineRun::new("run-1", sample_event(), 1_000);
        run.start(2_000).unwrap();
        run.requeue(5_000, "db unavailable");
        assert_eq!(run.state, RunState::Pending);
        assert_eq!(run.attempts, 1);
        assert_eq!(run.scheduled_at, 5_000);
        assert_eq!(run.started_at, None);
        assert_eq!(run.last_error.as_deref(), Some("db unavailable"));
    }
}
