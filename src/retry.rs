//! Bounded retry for eventually consistent bridge reads
//!
//! The mail application populates some values asynchronously (most visibly
//! the quoted content of a freshly opened reply). [`sample_until`] re-reads
//! such a value a fixed number of times with a fixed delay until an
//! acceptance predicate holds, and reports whether it ever did.

use std::time::Duration;

use crate::errors::AppResult;

/// Max attempts and fixed delay between them
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay_ms: u64) -> Self {
        Self {
            attempts: attempts.max(1),
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Outcome of a bounded sampling loop
#[derive(Debug)]
pub struct Sampled<T> {
    /// Last observed value, acceptable or not
    pub value: T,
    /// Whether the predicate held before attempts ran out
    pub satisfied: bool,
    /// Read attempts actually issued
    pub attempts_used: u32,
}

/// Re-run `read` until `accept` holds or attempts are exhausted
///
/// A read error aborts the loop immediately; eventual consistency is about
/// values arriving late, not about swallowing bridge failures. Exhaustion is
/// not an error: the last observed value is returned with
/// `satisfied == false` so the caller can decide whether that is fatal.
pub async fn sample_until<T, F, Fut, P>(
    policy: RetryPolicy,
    mut read: F,
    accept: P,
) -> AppResult<Sampled<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
    P: Fn(&T) -> bool,
{
    let mut attempt = 1;
    loop {
        let value = read().await?;
        if accept(&value) {
            return Ok(Sampled {
                value,
                satisfied: true,
                attempts_used: attempt,
            });
        }
        if attempt >= policy.attempts {
            return Ok(Sampled {
                value,
                satisfied: false,
                attempts_used: attempt,
            });
        }
        attempt += 1;
        tokio::time::sleep(policy.delay).await;
    }
}
