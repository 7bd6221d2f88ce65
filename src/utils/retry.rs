use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

/// Exponential backoff with an optional cap on the total time spent retrying.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    pub multiplier: f64,
    /// Upper bound for a single delay. `None` lets delays grow without limit.
    pub max_delay: Option<Duration>,
    /// Total retry budget measured from the first attempt. `None` retries forever.
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: None,
            max_elapsed: Some(Duration::from_secs(60)),
        }
    }
}

impl RetryPolicy {
    /// Same backoff as the default, retrying until the first success.
    pub fn unbounded() -> Self {
        Self {
            max_elapsed: None,
            ..Self::default()
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_elapsed(mut self, budget: Option<Duration>) -> Self {
        self.max_elapsed = budget;
        self
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);

        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed with an error the classifier refused to retry.
    Permanent(E),
    /// Retryable failures continued until the budget ran out.
    Exhausted {
        attempts: u32,
        elapsed: Duration,
        last: E,
    },
}

/// Runs `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or the policy's time budget is spent. Attempts never overlap.
pub async fn retry<T, E, Op, Fut, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: Op,
) -> std::result::Result<T, RetryError<E>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!("Succeeded on attempt {} after {:?}", attempt, start.elapsed());
                }
                return Ok(value);
            }
            Err(e) if !is_retryable(&e) => {
                tracing::debug!("Attempt {} failed permanently: {}", attempt, e);
                return Err(RetryError::Permanent(e));
            }
            Err(e) => {
                let elapsed = start.elapsed();
                let mut delay = policy.delay_for(attempt);

                if let Some(budget) = policy.max_elapsed {
                    if elapsed >= budget {
                        tracing::warn!(
                            "Giving up after {} attempts in {:?}: {}",
                            attempt,
                            elapsed,
                            e
                        );
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            elapsed,
                            last: e,
                        });
                    }
                    delay = delay.min(budget - elapsed);
                }

                tracing::warn!(
                    "Attempt {} failed: {}. Retrying in {:?}",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
