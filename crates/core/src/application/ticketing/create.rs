// Create Ticket Use Case

use crate::domain::{PipelineRun, Ticket, TicketCreatedEvent, TicketPriority};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TimeProvider, TransactionalTicketRepository};
use serde::{Deserialize, Serialize};

const SUBJECT_MAX_CHARS: usize = 200;
const DESCRIPTION_MAX_CHARS: usize = 10_000;

/// Create-ticket request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: String,
    pub category: String,

    #[serde(default)]
    pub priority: Option<TicketPriority>,

    pub user_id: String,
    pub user_email: String,
    pub user_name: String,
}

/// Validate a create request
pub fn validate_request(req: &CreateTicketRequest) -> Result<()> {
    if req.subject.trim().is_empty() {
        return Err(AppError::Validation("subject must not be empty".to_string()));
    }
    if req.subject.chars().count() > SUBJECT_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "subject too long (max {} chars)",
            SUBJECT_MAX_CHARS
        )));
    }
    if req.description.trim().is_empty() {
        return Err(AppError::Validation(
            "description must not be empty".to_string(),
        ));
    }
    if req.description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "description too long (max {} chars)",
            DESCRIPTION_MAX_CHARS
        )));
    }
    if req.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }
    if !req.user_email.contains('@') {
        return Err(AppError::Validation(format!(
            "invalid email address: {}",
            req.user_email
        )));
    }
    Ok(())
}

/// Execute ticket creation inside one transaction.
///
/// The per-year sequence increment, the ticket insert and the pipeline-run
/// enqueue commit atomically: numbers stay unique and strictly increasing
/// under concurrent creation, and a committed ticket always has a queued
/// run.
pub async fn execute(
    ticket_repo: &dyn TransactionalTicketRepository,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: CreateTicketRequest,
) -> Result<Ticket> {
    validate_request(&req)?;

    let now = time_provider.now_millis();
    let year = chrono::DateTime::from_timestamp_millis(now)
        .map(|dt| chrono::Datelike::year(&dt))
        .unwrap_or(1970);

    let mut tx = ticket_repo.begin_transaction().await?;

    // Serialized per year-bucket at the storage layer
    let seq = tx.next_ticket_seq(year).await?;
    let number = Ticket::format_number(year, seq);

    let ticket = Ticket::new(
        id_provider.generate_id(),
        number,
        req.subject.trim(),
        req.description.trim(),
        req.category.trim(),
        req.priority.unwrap_or_default(),
        req.user_id.clone(),
        now,
    );
    tx.insert_ticket(&ticket).await?;

    let event = TicketCreatedEvent {
        ticket_id: ticket.id.clone(),
        subject: ticket.subject.clone(),
        description: ticket.description.clone(),
        category: ticket.category.clone(),
        priority: ticket.priority,
        user_id: req.user_id,
        user_email: req.user_email,
        user_name: req.user_name,
    };
    let run = PipelineRun::new(id_provider.generate_id(), event, now);
    tx.enqueue_run(&run).await?;

    tx.commit().await?;

    Ok(ticket)
}
