//! Per-call deadlines.
//!
//! # Responsibilities
//! - Carry an optional deadline through a retry sequence
//! - Bound each attempt by whichever is sooner: the attempt timeout or the deadline
//! - Provide a backoff sleep that wakes early when the deadline arrives
//!
//! # Design Decisions
//! - Uses Tokio's monotonic clock, not wall-clock time
//! - Running out of time is reported distinctly from upstream failures

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context with no deadline: retries run until the budget is spent.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time budget for the next attempt, or `None` if the deadline has passed.
    pub fn attempt_timeout(&self, per_attempt: Duration) -> Option<Duration> {
        match self.deadline {
            None => Some(per_attempt),
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                (!left.is_zero()).then(|| left.min(per_attempt))
            }
        }
    }

    /// Sleep for `delay`, or until the deadline if that comes first.
    ///
    /// Returns false when the deadline cut the sleep short.
    pub async fn sleep(&self, delay: Duration) -> bool {
        let wake = Instant::now() + delay;
        match self.deadline {
            Some(deadline) if deadline <= wake => {
                sleep_until(deadline).await;
                false
            }
            _ => {
                sleep_until(wake).await;
                true
            }
        }
    }
}
