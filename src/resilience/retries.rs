//! Bind retry logic.
//!
//! # Responsibilities
//! - Retry a bind that failed with `AddrInUse`, when enabled
//! - Sleep with exponential backoff + jitter between attempts
//! - Abandon the wait as soon as shutdown is triggered
//!
//! # Design Decisions
//! - Disabled by default: a taken address is fatal, as with a plain bind
//! - Any other bind failure (permissions, bad address) is returned at once
//! - The last error is returned when attempts run out

use tokio::sync::broadcast;

use crate::config::RetryConfig;
use crate::error::{ServerError, ServerResult};
use crate::lifecycle::cancelled;
use crate::resilience::backoff::calculate_backoff;

/// Call `bind` until it succeeds, fails with a non-retryable error, or
/// `config.max_attempts` is exhausted. A shutdown during a backoff sleep
/// returns [`ServerError::Cancelled`].
pub async fn retry_bind<T, F>(
    config: &RetryConfig,
    shutdown: &mut broadcast::Receiver<()>,
    mut bind: F,
) -> ServerResult<T>
where
    F: FnMut() -> ServerResult<T>,
{
    let max_attempts = if config.enabled {
        config.max_attempts.max(1)
    } else {
        1
    };

    let mut attempt = 0;
    loop {
        match bind() {
            Ok(bound) => return Ok(bound),
            Err(e) if e.is_addr_in_use() && attempt + 1 < max_attempts => {
                attempt += 1;
                let delay = calculate_backoff(attempt, config);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Address in use, retrying bind"
                );
                tokio::select! {
                    biased;
                    _ = cancelled(shutdown) => return Err(ServerError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
}
