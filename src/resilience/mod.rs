//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream API:
//!     → timeouts.rs (per-attempt timeout, optional per-call deadline)
//!     → On failure: retries.rs (check if retryable)
//!     → backoff.rs (1s, 2s, 4s, ... before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream attempt has one
//! - Backoff sleeps are cancelled by the deadline, never slept through
//! - Retries are invisible to the caller; only the final outcome is reported

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::RetryPolicy;
pub use timeouts::RequestContext;
