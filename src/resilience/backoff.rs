//! Exponential backoff with optional jitter.

use std::time::Duration;
use rand::Rng;

/// Delay to wait after failed attempt number `attempt` (1-based).
///
/// `base_ms · 2^(attempt-1)`, capped at `max_ms`. With a 1000ms base this is
/// 1s, 2s, 4s, ... Attempt 0 means "nothing failed yet" and yields no delay.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    Duration::from_millis(delay_ms.min(max_ms))
}

/// Add up to `ratio · delay` of random extra wait.
pub fn apply_jitter(delay: Duration, ratio: f64) -> Duration {
    let jitter_range = (delay.as_millis() as f64 * ratio.clamp(0.0, 1.0)) as u64;
    if jitter_range == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_range))
}

/// Delays slept between attempts when every one of `max_attempts` fails.
///
/// There is one entry fewer than attempts: no delay follows the last one.
pub fn backoff_schedule(max_attempts: u32, base_ms: u64, max_ms: u64) -> Vec<Duration> {
    (1..max_attempts)
        .map(|attempt| calculate_backoff(attempt, base_ms, max_ms))
        .collect()
}
