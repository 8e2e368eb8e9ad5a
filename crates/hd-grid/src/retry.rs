//! Bounded readiness polling.
//!
//! The grid publishes its cell size some time after the page loads, so
//! consumers poll for it with a fixed delay and a fixed attempt budget. Giving
//! up is a normal outcome, not an error.

use std::future::Future;
use std::time::Duration;

/// Default delay between attempts.
const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Default attempt budget.
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Fixed-delay, fixed-budget retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between two consecutive attempts.
    pub delay: Duration,
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Terminal state of a polling run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// The check produced a value on attempt number `attempts` (1-based).
    Ready { value: T, attempts: u32 },
    /// The budget ran out after `attempts` unsuccessful checks.
    GaveUp { attempts: u32 },
}

impl<T> RetryOutcome<T> {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Number of checks that ran.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts, .. } | Self::GaveUp { attempts } => *attempts,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ready { value, .. } => Some(value),
            Self::GaveUp { .. } => None,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given delay and attempt budget.
    #[must_use]
    pub const fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    /// Poll `check` on the current thread until it returns `Some` or the
    /// budget is exhausted.
    ///
    /// The check receives the 1-based attempt number. The thread sleeps for
    /// `delay` between attempts, never after the last one.
    pub fn run<T>(&self, mut check: impl FnMut(u32) -> Option<T>) -> RetryOutcome<T> {
        for attempt in 1..=self.max_attempts {
            if let Some(value) = check(attempt) {
                return RetryOutcome::Ready {
                    value,
                    attempts: attempt,
                };
            }
            if attempt < self.max_attempts {
                std::thread::sleep(self.delay);
            }
        }

        self.gave_up()
    }

    /// Async variant of [`run`](Self::run) that sleeps on the tokio timer.
    pub async fn run_async<T, F, Fut>(&self, mut check: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for attempt in 1..=self.max_attempts {
            if let Some(value) = check(attempt).await {
                return RetryOutcome::Ready {
                    value,
                    attempts: attempt,
                };
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.delay).await;
            }
        }

        self.gave_up()
    }

    fn gave_up<T>(&self) -> RetryOutcome<T> {
        tracing::debug!(attempts = self.max_attempts, "Readiness polling gave up");
        RetryOutcome::GaveUp {
            attempts: self.max_attempts,
        }
    }
}
