//! Explicit retry policy shared by the digitization client and the LLM
//! client: classification, wait, attempt-count composed around each
//! external call rather than in-process exception control flow.

use std::time::Duration;
use tracing::warn;

/// How a single attempt's failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 429, or an explicit rate-limit signal. Retried; waits `2^attempt`.
    RateLimited,
    /// Timeout, 5xx, transport reset. Retried with exponential backoff.
    Transient,
    /// 4xx other than 429, schema validation failure, malformed input.
    /// Never retried.
    Permanent,
}

/// Composable retry policy: max attempts plus the backoff schedule for each
/// classification. Both the digitization client (`2^attempt` seconds,
/// max 3 attempts) and the LLM client (1s, 2s, 4s, max 3 attempts) are
/// instances of this same object.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Backoff duration before the given 1-based attempt number, for the
    /// given failure classification. `attempt` is the attempt that just
    /// failed; the return value is how long to wait before the next one.
    pub fn backoff(&self, classification: Classification, attempt: u32) -> Duration {
        match classification {
            Classification::RateLimited => Duration::from_secs(2u64.pow(attempt - 1)),
            Classification::Transient => Duration::from_secs(1u64 << (attempt - 1).min(2)),
            Classification::Permanent => Duration::ZERO,
        }
    }

    pub fn should_retry(&self, classification: Classification, attempt: u32) -> bool {
        classification != Classification::Permanent && attempt < self.max_attempts
    }

    /// Runs `op` under this policy. `op` returns `Err((classification, err))`
    /// on failure; the closure is retried until it succeeds, a permanent
    /// failure occurs, or the attempt budget is exhausted.
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, (Classification, E)>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err((classification, err)) => {
                    if self.should_retry(classification, attempt) {
                        let wait = self.backoff(classification, attempt);
                        warn!(
                            attempt,
                            ?classification,
                            wait_secs = wait.as_secs_f64(),
                            "retrying after failed attempt"
                        );
                        tokio::time::sleep(wait).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
