// Retry policy for failed pipeline runs
//
// Fatal errors (missing ticket, domain violations, corrupt payloads) are
// never retried. Transient infrastructure errors retry the whole run with
// exponential backoff until max attempts.

use crate::domain::PipelineRun;
use crate::error::AppError;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the run (with backoff delay in ms)
    Retry(i64),
    /// Do not retry, the run has failed permanently
    Fatal,
}

/// Retry policy
///
/// Backoff formula: delay = base_delay * (backoff_factor ^ attempts),
/// with deterministic ±10% jitter seeded from the run id.
pub struct RetryPolicy {
    base_delay_ms: i64,
}

impl RetryPolicy {
    pub fn new(base_delay_ms: i64) -> Self {
        Self { base_delay_ms }
    }

    /// Decide whether a failed run should be retried.
    pub fn decide(&self, run: &PipelineRun, error: &AppError) -> RetryDecision {
        if !error.is_retryable() {
            warn!(
                run_id = %run.id,
                error = %error,
                "Fatal pipeline error, not retrying"
            );
            return RetryDecision::Fatal;
        }

        if run.attempts >= run.max_attempts {
            warn!(
                run_id = %run.id,
                attempts = %run.attempts,
                max_attempts = %run.max_attempts,
                "Max retry attempts reached"
            );
            return RetryDecision::Fatal;
        }

        let base_delay_ms = self.base_delay_ms as f64 * run.backoff_factor.powi(run.attempts);

        // ±10% jitter to avoid thundering herd; seeded from the run id so
        // the delay is deterministic per run.
        let jitter_seed = run.id.chars().map(|c| c as u32).sum::<u32>();
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0); // 0.9 to 1.1

        let delay_ms = (base_delay_ms * jitter_factor) as i64;

        info!(
            run_id = %run.id,
            attempt = %run.attempts,
            max_attempts = %run.max_attempts,
            delay_ms = %delay_ms,
            "Scheduling retry"
        );

        RetryDecision::Retry(delay_ms)
    }
}
