//! Convergence polling (linear backoff)
//!
//! Waits for an eventually-consistent resource to become queryable by
//! repeatedly fetching it until a predicate holds.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Backoff schedule of a convergence poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Sleep after the first unsuccessful attempt
    pub initial_delay: Duration,
    /// Added to the sleep after every further unsuccessful attempt
    pub increment: Duration,
    /// Attempts before giving up
    pub max_attempts: u32,
}

impl PollSchedule {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

    /// Project activation: 1, 2, 3, ... time units between attempts
    pub fn activation(unit: Duration) -> Self {
        Self {
            initial_delay: unit,
            increment: unit,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// App registration: the first fetch is immediate and the n-th later
    /// fetch waits n time units
    pub fn registration(unit: Duration) -> Self {
        Self {
            initial_delay: unit,
            increment: unit,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sleep after the `failures`-th unsuccessful attempt (1-based)
    pub fn delay_after_failure(&self, failures: u32) -> Duration {
        self.initial_delay
            .saturating_add(self.increment.saturating_mul(failures.saturating_sub(1)))
    }
}

/// Poll `fetch` until `converged` accepts its result
///
/// # Returns
/// * `Ok(value)` - the first fetched value accepted by `converged`
/// * `Err(CloudError::DidNotConverge)` - `max_attempts` values were rejected
pub async fn poll<T, F, Fut, P>(
    operation: &str,
    schedule: &PollSchedule,
    mut fetch: F,
    converged: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    for attempt in 1..=schedule.max_attempts {
        let value = fetch().await;
        if converged(&value) {
            tracing::debug!("{} converged after {} attempt(s)", operation, attempt);
            return Ok(value);
        }

        // No sleep once the budget is spent
        if attempt < schedule.max_attempts {
            let delay = schedule.delay_after_failure(attempt);
            tracing::info!(
                "{} not ready yet, checking again in {:?} (attempt {}/{})",
                operation,
                delay,
                attempt,
                schedule.max_attempts
            );
            sleep(delay).await;
        }
    }

    Err(CloudError::DidNotConverge {
        operation: operation.to_string(),
        attempts: schedule.max_attempts,
    })
}
