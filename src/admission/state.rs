//! Per-caller admission state.

use std::collections::VecDeque;
use std::time::{Duration, SystemTime};

/// Request history and burst credits for one caller.
///
/// Timestamps are kept in arrival order, so the front is the oldest and the
/// back is the most recent request.
#[derive(Debug, Clone)]
pub struct ClientState {
    timestamps: VecDeque<SystemTime>,
    burst_tokens: u32,
}

impl ClientState {
    /// Fresh state with a full burst allowance.
    pub fn new(burst_capacity: u32) -> Self {
        Self {
            timestamps: VecDeque::new(),
            burst_tokens: burst_capacity,
        }
    }

    /// Drop every request older than `window_start`.
    pub fn trim(&mut self, window_start: SystemTime) {
        while self.timestamps.front().is_some_and(|t| *t < window_start) {
            self.timestamps.pop_front();
        }
    }

    /// Earn back one credit per full `refill_interval` since the last request.
    ///
    /// A caller with no recorded history gets the full allowance.
    pub fn refill(&mut self, now: SystemTime, capacity: u32, refill_interval: Duration) {
        let Some(last) = self.timestamps.back() else {
            self.burst_tokens = capacity;
            return;
        };
        let elapsed = now.duration_since(*last).unwrap_or_default();
        let earned = elapsed.as_nanos() / refill_interval.as_nanos().max(1);
        let earned = u32::try_from(earned).unwrap_or(u32::MAX);
        self.burst_tokens = self.burst_tokens.saturating_add(earned).min(capacity);
    }

    /// Record an admitted request and spend one credit.
    pub fn record(&mut self, now: SystemTime) {
        self.timestamps.push_back(now);
        self.burst_tokens = self.burst_tokens.saturating_sub(1);
    }

    pub fn burst_tokens(&self) -> u32 {
        self.burst_tokens
    }

    /// Requests currently held (call [`trim`](Self::trim) first for an exact window count).
    pub fn request_count(&self) -> usize {
        self.timestamps.len()
    }

    /// Requests at or after `window_start`, without trimming.
    pub fn count_since(&self, window_start: SystemTime) -> usize {
        self.timestamps.iter().filter(|t| **t >= window_start).count()
    }

    pub fn oldest(&self) -> Option<SystemTime> {
        self.timestamps.front().copied()
    }

    pub fn latest(&self) -> Option<SystemTime> {
        self.timestamps.back().copied()
    }

    /// True when no request was seen at or after `cutoff`.
    pub fn is_idle_since(&self, cutoff: SystemTime) -> bool {
        self.latest().map_or(true, |t| t < cutoff)
    }
}
