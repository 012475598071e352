// TicketFlow Infrastructure - SQLite Adapter
// Implements: TicketRepository, UserRepository, RunRepository,
// TransactionalTicketRepository

mod connection;
mod error;
mod migration;
mod run_repository;
mod ticket_repository;
mod transaction;
mod user_repository;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use run_repository::SqliteRunRepository;
pub use ticket_repository::SqliteTicketRepository;
pub use transaction::SqliteTicketTransaction;
pub use user_repository::SqliteUserRepository;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
