use std::time::Duration;

use log::*;
use rand::Rng;
use tokio::time::sleep;

/// Jittered exponential backoff for ledger API calls.
///
/// The delay before retry `n` (0-based) is `base_delay_ms * 2^n`, capped at `max_delay_ms`, then spread by up to
/// `jitter_pct` in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_pct: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64, max_delay_ms: u64, jitter_pct: f64) -> Self {
        let max_attempts = max_attempts.max(1);
        let base_delay_ms = base_delay_ms.max(1);
        let max_delay_ms = max_delay_ms.max(base_delay_ms);
        let jitter_pct = jitter_pct.clamp(0.0, 1.0);
        Self { max_attempts, base_delay_ms, max_delay_ms, jitter_pct }
    }

    /// A policy that gives up straight away.
    pub fn no_retries() -> Self {
        Self::new(1, 1, 1, 0.0)
    }

    fn next_delay(&self, retry: usize) -> Duration {
        let exp = 2_u64.saturating_pow(retry.min(u32::MAX as usize) as u32);
        let delay = self.base_delay_ms.saturating_mul(exp).min(self.max_delay_ms);
        let delay = if self.jitter_pct > 0.0 {
            let spread = (delay as f64 * self.jitter_pct) as i64;
            let delta = rand::thread_rng().gen_range(-spread..=spread);
            delay.saturating_add_signed(delta)
        } else {
            delay
        };
        Duration::from_millis(delay)
    }

    /// Calls `op` until it succeeds or the attempts run out. `op` receives the 0-based attempt number.
    pub async fn retry_async<F, Fut, T, E>(&self, op: F) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.retry_async_when(|_| true, op).await
    }

    /// Like [`RetryPolicy::retry_async`], but errors for which `should_retry` returns false are returned immediately.
    pub async fn retry_async_when<P, F, Fut, T, E>(&self, should_retry: P, mut op: F) -> Result<T, E>
    where
        P: Fn(&E) -> bool,
        F: FnMut(usize) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(val) => return Ok(val),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !should_retry(&err) {
                        return Err(err);
                    }
                    let delay = self.next_delay(attempt - 1);
                    debug!("🔁️ Attempt {attempt} of {} failed. Retrying in {}ms", self.max_attempts, delay.as_millis());
                    sleep(delay).await;
                },
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 250, 5_000, 0.2)
    }
}
