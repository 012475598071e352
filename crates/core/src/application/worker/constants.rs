// Worker constants (no magic values inline)
use std::time::Duration;

/// Sleep duration when no runs are due (250ms)
pub const IDLE_SLEEP_DURATION: Duration = Duration::from_millis(250);

/// Sleep duration after a worker error before trying again (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Default retry base delay (1000ms = 1s)
pub const DEFAULT_RETRY_BASE_DELAY_MS: i64 = 1000;

/// Default recovery window for runs orphaned by a crash (5 minutes)
pub const DEFAULT_RECOVERY_WINDOW_MS: i64 = 5 * 60 * 1000;
