// Port Layer - Interfaces for external dependencies

pub mod analysis_provider;
pub mod id_provider; // For deterministic testing
pub mod mailer;
pub mod run_repository;
pub mod ticket_repository;
pub mod time_provider;
pub mod transaction;
pub mod user_repository;

// Re-exports
pub use analysis_provider::{AnalysisProvider, ProviderError};
pub use id_provider::IdProvider;
pub use mailer::{Email, MailError, Mailer};
pub use run_repository::RunRepository;
pub use ticket_repository::TicketRepository;
pub use time_provider::TimeProvider;
pub use transaction::{TicketCreationTransaction, Transaction, TransactionalTicketRepository};
pub use user_repository::UserRepository;
