// Application Layer - Use Cases and Business Logic

pub mod analysis;
pub mod notify;
pub mod pipeline;
pub mod recovery;
pub mod retry;
pub mod selector;
pub mod ticketing;
pub mod worker;

// Re-exports
pub use analysis::AnalysisClient;
pub use notify::{DispatchOutcome, NotificationDispatcher};
pub use pipeline::{Assignment, PipelineOutcome, TicketPipeline};
pub use ticketing::TicketService;
pub use worker::{shutdown_channel, PipelineWorker, ShutdownSender, ShutdownToken};
