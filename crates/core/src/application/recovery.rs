// Crash recovery for orphaned pipeline runs
//
// On daemon startup, runs left in RUNNING by a crashed process are put
// back in the queue. Every pipeline step is idempotent, so re-running an
// interrupted run is always safe.

use crate::application::worker::constants::DEFAULT_RECOVERY_WINDOW_MS;
use crate::domain::RunState;
use crate::port::{RunRepository, TimeProvider};
use std::sync::Arc;
use tracing::info;

pub struct RecoveryService {
    runs: Arc<dyn RunRepository>,
    time_provider: Arc<dyn TimeProvider>,
    recovery_window_ms: i64,
}

impl RecoveryService {
    pub fn new(
        runs: Arc<dyn RunRepository>,
        time_provider: Arc<dyn TimeProvider>,
        recovery_window_ms: Option<i64>,
    ) -> Self {
        Self {
            runs,
            time_provider,
            recovery_window_ms: recovery_window_ms.unwrap_or(DEFAULT_RECOVERY_WINDOW_MS),
        }
    }

    /// Requeue runs stuck in RUNNING longer than the recovery window.
    ///
    /// # Returns
    /// Number of runs recovered
    pub async fn recover_orphaned_runs(&self) -> crate::error::Result<usize> {
        let now = self.time_provider.now_millis();
        let cutoff = now - self.recovery_window_ms;

        info!(
            cutoff_time = %cutoff,
            recovery_window_ms = %self.recovery_window_ms,
            "Starting orphaned run recovery"
        );

        let running = self.runs.find_by_state(RunState::Running).await?;
        let mut recovered = 0;

        for mut run in running {
            let orphaned = match run.started_at {
                Some(started_at) => started_at < cutoff,
                None => true,
            };
            if !orphaned {
                continue;
            }
            info!(run_id = %run.id, started_at = ?run.started_at, "Recovering orphaned run");
            run.requeue(now, "recovered after crash");
            self.runs.update(&run).await?;
            recovered += 1;
        }

        info!(recovered_runs = recovered, "Orphaned run recovery completed");
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PipelineRun, TicketCreatedEvent, TicketPriority};
    use crate::port::run_repository::mocks::MockRunRepository;
    use crate::port::time_provider::mocks::FixedTimeProvider;

    fn sample_run(id: &str) -> PipelineRun {
        PipelineRun::new(
            id,
            TicketCreatedEvent {
                ticket_id: "t-1".to_string(),
                subject: "s".to_string(),
                description: "d".to_string(),
                category: "General".to_string(),
                priority: TicketPriority::Medium,
                user_id: "u-1".to_string(),
                user_email: "u@example.com".to_string(),
                user_name: "U".to_string(),
            },
            1_000,
        )
    }

    #[tokio::test]
    async fn test_stale_running_run_is_requeued() {
        let runs = Arc::new(MockRunRepository::new());
        let mut run = sample_run("run-1");
        run.start(1_000).unwrap();
        runs.enqueue(&run).await.unwrap();

        let now = 1_000 + DEFAULT_RECOVERY_WINDOW_MS + 1;
        let service = RecoveryService::new(
            runs.clone(),
            Arc::new(FixedTimeProvider::new(now)),
            None,
        );
        let recovered = service.recover_orphaned_runs().await.unwrap();
        assert_eq!(recovered, 1);

        let stored = runs.get("run-1").unwrap();
        assert_eq!(stored.state, RunState::Pending);
        assert_eq!(stored.attempts, 1);
    }

    #[tokio::test]
    async fn test_recent_running_run_left_alone() {
        let runs = Arc::new(MockRunRepository::new());
        let mut run = sample_run("run-1");
        run.start(1_000).unwrap();
        runs.enqueue(&run).await.unwrap();

        let service = RecoveryService::new(
            runs.clone(),
            Arc::new(FixedTimeProvider::new(2_000)),
            None,
        );
        let recovered = service.recover_orphaned_runs().await.unwrap();
        assert_eq!(recovered, 0);
        assert_eq!(runs.get("run-1").unwrap().state, RunState::Running);
    }
}
