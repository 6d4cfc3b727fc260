//! Retry with capped exponential backoff.
//!
//! Used in two places: `ExpoDb::execute_with`/`query_with` retry transient
//! `SQLITE_BUSY`/`SQLITE_LOCKED` errors in-process, and the fan-out outbox
//! schedules its next attempt with the same delay curve.

use std::time::Duration;

use expo_config::OutboxConfig;

/// Backoff parameters.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    /// Outbox schedule built from configuration.
    #[must_use]
    pub fn from_outbox(config: &OutboxConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay to wait after `attempt` failed attempts (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}

/// Detect lock contention errors that resolve on their own.
///
/// Narrow on purpose: constraint violations and SQL errors are never retried.
pub fn is_transient_error(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("database is locked")
        || msg.contains("database table is locked")
        || msg.contains("SQLITE_BUSY")
}
