// Domain Layer - Pure business logic and entities

pub mod analysis;
pub mod error;
pub mod notification;
pub mod run;
pub mod ticket;
pub mod user;

// Re-exports
pub use analysis::{AnalysisResult, RawAnalysis, TicketCategory};
pub use error::DomainError;
pub use notification::NotificationRequest;
pub use run::{PipelineRun, RunId, RunState, TicketCreatedEvent};
pub use ticket::{Comment, Ticket, TicketId, TicketPriority, TicketStatus};
pub use user::{ModeratorCandidate, User, UserId, UserRole};
