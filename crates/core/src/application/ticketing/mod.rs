// Ticket Service - ticket creation use case

pub mod create;


pub use create::CreateTicketRequest;

use crate::domain::Ticket;
use crate::error::Result;
use crate::port::{IdProvider, TimeProvider, TransactionalTicketRepository};
use std::sync::Arc;

/// Ticket Service
pub struct TicketService {
    ticket_repo: Arc<dyn TransactionalTicketRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl TicketService {
    pub fn new(
        ticket_repo: Arc<dyn TransactionalTicketRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            ticket_repo,
            id_provider,
            time_provider,
        }
    }

    /// Create a new ticket and enqueue its pipeline run
    pub async fn create(&self, req: CreateTicketRequest) -> Result<Ticket> {
        create::execute(
            self.ticket_repo.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await
    }
}
