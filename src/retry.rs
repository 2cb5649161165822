//! Exponential-backoff retry around any fallible operation.
//!
//! Attempt `i` (0-based) that fails before the last one is followed by a wait of
//! `base_delay * 2^i`. The last failure is handed back untouched. The async and
//! blocking runners share the schedule, so a sink can be blocking or async
//! without changing how it is retried.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use metrics::counter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait after failed attempt `i`.
    pub fn delay_for(&self, i: u32) -> Duration {
        let factor = 1u32.checked_shl(i).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// The full list of waits a run that always fails would go through.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.attempts() - 1).map(|i| self.delay_for(i)).collect()
    }

    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.attempts();
        let mut i = 0u32;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if i + 1 < attempts => {
                    let delay = self.delay_for(i);
                    self.log_retry(label, i, &e, delay);
                    tokio::time::sleep(delay).await;
                    i += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn run_blocking<T, E, F>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        let attempts = self.attempts();
        let mut i = 0u32;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if i + 1 < attempts => {
                    let delay = self.delay_for(i);
                    self.log_retry(label, i, &e, delay);
                    std::thread::sleep(delay);
                    i += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn log_retry(&self, label: &str, i: u32, e: &dyn Display, delay: Duration) {
        tracing::warn!(
            op = label,
            attempt = i + 1,
            max_attempts = self.attempts(),
            delay_ms = delay.as_millis() as u64,
            error = %e,
            "attempt failed, retrying"
        );
        counter!("relay_send_retries_total").increment(1);
    }
}
