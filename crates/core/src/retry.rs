//! Retry helper for transient infrastructure failures.
//!
//! Both the single and bulk annotation upsert paths go through
//! [`with_retries`]: up to three attempts with exponential backoff,
//! 2 s doubling to a 6 s cap. The caller supplies a predicate deciding
//! which errors are transient; everything else is surfaced immediately.

use std::future::Future;
use std::time::Duration;

/// Backoff parameters for [`with_retries`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub cap_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            cap_delay: Duration::from_secs(6),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `n` (1-based). Doubles from the base,
    /// capped at `cap_delay`.
    pub fn delay_for(&self, n: u32) -> Duration {
        let factor = 2u32.saturating_pow(n.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.cap_delay)
    }
}

/// Run `op`, retrying on errors accepted by `is_transient`.
///
/// The final error (transient or not) is returned unchanged.
pub async fn with_retries<T, E, F, Fut, P>(
    policy: RetryPolicy,
    is_transient: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts && is_transient(&err) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
