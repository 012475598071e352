// Pipeline Worker - claims due runs and executes the ticket pipeline

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::pipeline::TicketPipeline;
use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::error::Result;
use crate::port::{RunRepository, TimeProvider};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info};

/// Worker processing the durable run queue. Multiple workers may share one
/// queue; the repository's claim is atomic, so a run is executed by at
/// most one worker at a time.
pub struct PipelineWorker {
    runs: Arc<dyn RunRepository>,
    pipeline: Arc<TicketPipeline>,
    retry_policy: Arc<RetryPolicy>,
    time_provider: Arc<dyn TimeProvider>,
}

impl PipelineWorker {
    pub fn new(
        runs: Arc<dyn RunRepository>,
        pipeline: Arc<TicketPipeline>,
        retry_policy: Arc<RetryPolicy>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            runs,
            pipeline,
            retry_policy,
            time_provider,
        }
    }

    /// Run worker loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!("Pipeline worker started");
        loop {
            if shutdown.is_shutdown() {
                info!("Pipeline worker shutting down");
                break;
            }
            match self.process_next_run().await {
                Ok(processed) => {
                    if !processed {
                        // No run due, sleep briefly (or wait for shutdown)
                        tokio::select! {
                            _ = sleep(IDLE_SLEEP_DURATION) => {},
                            _ = shutdown.wait() => {
                                info!("Pipeline worker interrupted during idle");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Worker error: {}", e);
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => {
                            info!("Pipeline worker interrupted during error recovery");
                            break;
                        }
                    }
                }
            }
        }
        info!("Pipeline worker stopped");
        Ok(())
    }

    /// Claim and execute the next due run (returns true if one was processed)
    pub async fn process_next_run(&self) -> Result<bool> {
        let now = self.time_provider.now_millis();
        // Claimed run is already atomically RUNNING in storage
        let mut run = match self.runs.claim_next(now).await? {
            Some(r) => r,
            None => return Ok(false),
        };

        info!(run_id = %run.id, ticket_id = %run.ticket_id, attempt = %run.attempts, "Processing pipeline run");

        match self.pipeline.run(&run.event).await {
            Ok(outcome) => {
                let now = self.time_provider.now_millis();
                run.complete(now)?;
                self.runs.update(&run).await?;
                info!(
                    run_id = %run.id,
                    ticket_id = %run.ticket_id,
                    assignment = ?outcome.assignment,
                    notifications_sent = outcome.notifications_sent,
                    "Pipeline run done"
                );
            }
            Err(e) => match self.retry_policy.decide(&run, &e) {
                RetryDecision::Retry(delay_ms) => {
                    let now = self.time_provider.now_millis();
                    info!(
                        run_id = %run.id,
                        attempt = %run.attempts,
                        delay_ms = %delay_ms,
                        error = %e,
                        "Retrying run after failure"
                    );
                    run.requeue(now + delay_ms, e.to_string());
                    self.runs.update(&run).await?;
                }
                RetryDecision::Fatal => {
                    error!(run_id = %run.id, error = %e, "Run failed permanently");
                    let now = self.time_provider.now_millis();
                    run.fail(now, e.to_string());
                    self.runs.update(&run).await?;
                }
            },
        }
        Ok(true)
    }
}
