// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid satisfaction rating: {0} (must be 1-5)")]
    InvalidRating(i32),

    #[error("Satisfaction rating already set for ticket {0}")]
    RatingAlreadySet(String),

    #[error("Only the ticket creator may rate it")]
    NotTicketCreator,

    #[error("Ticket must be resolved or closed before rating")]
    TicketNotClosed,
}

pub type Result<T> = std::result::Result<T, DomainError>;
