// Worker timings
use std::time::Duration;

/// Pause between polls of an empty queue
pub const IDLE_SLEEP_DURATION: Duration = Duration::from_millis(100);

/// Pause after a repository error before polling again
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// RUNNING jobs started longer ago than this are requeued on startup
pub const DEFAULT_RECOVERY_WINDOW_MS: i64 = 5 * 60 * 1000;
