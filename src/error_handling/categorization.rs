//! Error categorization and retry strategy.
//!
//! This module decides which connection errors are worth retrying and builds
//! the backoff schedule used by the connector.

use std::io::ErrorKind;
use std::time::Duration;

use crate::config::RetryPolicy;

/// Creates a linear backoff retry strategy.
///
/// Yields one delay per retry: `base_delay`, `2 * base_delay`, ... up to
/// `(max_attempts - 1) * base_delay`. With the defaults (7 attempts, 1s) this
/// is 1s..6s, 21s in total.
///
/// # Returns
///
/// A retry strategy iterator ready for use with `tokio_retry::RetryIf`.
pub fn get_retry_strategy(policy: &RetryPolicy) -> impl Iterator<Item = Duration> {
    let base = policy.base_delay;
    let retries = u32::try_from(policy.max_attempts.saturating_sub(1)).unwrap_or(u32::MAX);
    (1..=retries).map(move |attempt| backoff_delay(base, attempt))
}

/// Delay before retry `attempt`: `attempt * base`, saturating at `Duration::MAX`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(attempt).unwrap_or(Duration::MAX)
}

/// Returns true if the error means the server was unreachable at the
/// transport level (the only class of error the connector retries).
///
/// Drivers do not always keep the `io::ErrorKind`, so the message is checked
/// as well.
pub fn is_connection_refused(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(e) if e.kind() == ErrorKind::ConnectionRefused => true,
        other => other
            .to_string()
            .to_ascii_lowercase()
            .contains("connection refused"),
    }
}
