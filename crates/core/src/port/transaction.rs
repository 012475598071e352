// Transaction port for atomic ticket creation

use crate::domain::{PipelineRun, Ticket};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Transactional ticket-creation operations
#[async_trait]
pub trait TransactionalTicketRepository: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<Box<dyn TicketCreationTransaction>>;
}

/// Operations available within a ticket-creation transaction.
///
/// The sequence increment, the ticket insert and the run enqueue commit
/// together, so ticket numbers stay unique/monotonic under concurrency and
/// a visible ticket always has a queued pipeline run.
#[async_trait]
pub trait TicketCreationTransaction: Transaction {
    /// Next value of the per-year ticket sequence (serialized per
    /// year-bucket at the storage layer)
    async fn next_ticket_seq(&mut self, year: i32) -> Result<i64>;

    /// Insert ticket (within transaction)
    async fn insert_ticket(&mut self, ticket: &Ticket) -> Result<()>;

    /// Enqueue pipeline run (within transaction)
    async fn enqueue_run(&mut self, run: &PipelineRun) -> Result<()>;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub struct MockCreationStore {
        pub sequences: Mutex<HashMap<i32, i64>>,
        pub tickets: Mutex<Vec<Ticket>>,
        pub runs: Mutex<Vec<PipelineRun>>,
        pub committed: Mutex<bool>,
    }

    /// In-memory transactional repository. Writes land in the shared store
    /// immediately; `committed` records whether commit was reached (the
    /// mock does not roll back).
    pub struct MockTransactionalTicketRepository {
        pub store: Arc<MockCreationStore>,
    }

    impl Default for MockTransactionalTicketRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTransactionalTicketRepository {
        pub fn new() -> Self {
            Self {
                store: Arc::new(MockCreationStore::default()),
            }
        }
    }

    pub struct MockTicketTransaction {
        store: Arc<MockCreationStore>,
    }

    #[async_trait]
    impl TransactionalTicketRepository for MockTransactionalTicketRepository {
        async fn begin_transaction(&self) -> Result<Box<dyn TicketCreationTransaction>> {
            Ok(Box::new(MockTicketTransaction {
                store: Arc::clone(&self.store),
            }))
        }
    }

    #[async_trait]
    impl Transaction for MockTicketTransaction {
        async fn commit(self: Box<Self>) -> Result<()> {
            *self.store.committed.lock().unwrap() = true;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl TicketCreationTransaction for MockTicketTransaction {
        async fn next_ticket_seq(&mut self, year: i32) -> Result<i64> {
            let mut sequences = self.store.sequences.lock().unwrap();
            let seq = sequences.entry(year).or_insert(0);
            *seq += 1;
            Ok(*seq)
        }

        async fn insert_ticket(&mut self, ticket: &Ticket) -> Result<()> {
            self.store.tickets.lock().unwrap().push(ticket.clone());
            Ok(())
        }

        async fn enqueue_run(&mut self, run: &PipelineRun) -> Result<()> {
            self.store.runs.lock().unwrap().push(run.clone());
            Ok(())
        }
    }
}
