// Pipeline Run Repository Port (Interface)

use crate::domain::{PipelineRun, RunState};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for the durable run queue.
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Insert a new pending run
    async fn enqueue(&self, run: &PipelineRun) -> Result<()>;

    /// Atomically claim the next due pending run (pending -> running).
    /// Runs whose `scheduled_at` lies in the future are not claimed.
    /// Concurrent workers never claim the same run twice.
    async fn claim_next(&self, now_millis: i64) -> Result<Option<PipelineRun>>;

    /// Update a run
    async fn update(&self, run: &PipelineRun) -> Result<()>;

    /// Find all runs in a given state (used by crash recovery)
    async fn find_by_state(&self, state: RunState) -> Result<Vec<PipelineRun>>;
}

// ============================================================================
// Mock Implementation for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    /// In-memory run queue
    pub struct MockRunRepository {
        runs: Mutex<Vec<PipelineRun>>,
    }

    impl Default for MockRunRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockRunRepository {
        pub fn new() -> Self {
            Self {
                runs: Mutex::new(Vec::new()),
            }
        }

        pub fn get(&self, id: &str) -> Option<PipelineRun> {
            self.runs.lock().unwrap().iter().find(|r| r.id == id).cloned()
        }
    }

    #[async_trait]
    impl RunRepository for MockRunRepository {
        async fn enqueue(&self, run: &PipelineRun) -> Result<()> {
            self.runs.lock().unwrap().push(run.clone());
            Ok(())
        }

        async fn claim_next(&self, now_millis: i64) -> Result<Option<PipelineRun>> {
            let mut runs = self.runs.lock().unwrap();
            let next = runs
                .iter_mut()
                .filter(|r| r.state == RunState::Pending && r.scheduled_at <= now_millis)
                .min_by_key(|r| (r.scheduled_at, r.created_at));
            match next {
                Some(run) => {
                    run.state = RunState::Running;
                    run.started_at = Some(now_millis);
                    Ok(Some(run.clone()))
                }
                None => Ok(None),
            }
        }

        async fn update(&self, run: &PipelineRun) -> Result<()> {
            let mut runs = self.runs.lock().unwrap();
            let stored = runs
                .iter_mut()
                .find(|r| r.id == run.id)
                .ok_or_else(|| AppError::NotFound(format!("Run {} not found", run.id)))?;
            *stored = run.clone();
            Ok(())
        }

        async fn find_by_state(&self, state: RunState) -> Result<Vec<PipelineRun>> {
            Ok(self
                .runs
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.state == state)
                .cloned()
                .collect())
        }
    }
}
