//! Per-caller admission control.
//!
//! Each caller is limited by two rules, checked in this order:
//! 1. Burst credits: one is spent per admitted call, and one is earned back
//!    for every full refill interval (10s by default) since the caller's
//!    last admitted call.
//! 2. Sliding window: at most `requests_per_minute` admitted calls within
//!    the last window (60s by default).
//!
//! The burst rule runs first so that short spikes get a short retry hint.
//!
//! # Concurrency
//! The registry is a `DashMap`. A check holds the shard write lock of its
//! caller's entry for the whole trim → refill → decide → record sequence, so
//! two concurrent checks for one caller cannot both spend the last credit.
//! Callers on other shards are not blocked. [`AdmissionController::sweep`]
//! goes through `DashMap::retain`, which takes the same shard locks.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::admission::decision::{
    AdmissionDecision, AdmissionReason, ClientStatus, GlobalStats,
};
use crate::admission::state::ClientState;
use crate::clock::{ceil_secs, Clock, SystemClock};
use crate::config::AdmissionConfig;
use crate::observability::metrics;

/// Numeric limits applied to every caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    pub requests_per_minute: u32,
    pub burst_capacity: u32,
    pub window: Duration,
    pub refill_interval: Duration,
    pub idle_timeout: Duration,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self::from(&AdmissionConfig::default())
    }
}

impl From<&AdmissionConfig> for AdmissionLimits {
    fn from(config: &AdmissionConfig) -> Self {
        Self {
            requests_per_minute: config.requests_per_minute,
            burst_capacity: config.burst_capacity,
            window: Duration::from_secs(config.window_secs),
            refill_interval: Duration::from_secs(config.refill_interval_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }
}

/// Tracks request history per caller and answers "may this call proceed?".
#[derive(Debug)]
pub struct AdmissionController {
    clients: DashMap<String, ClientState>,
    limits: AdmissionLimits,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    /// Create a controller backed by the system clock.
    pub fn new(limits: AdmissionLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    /// Create a controller that reads time from `clock`.
    pub fn with_clock(limits: AdmissionLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            clients: DashMap::new(),
            limits,
            clock,
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(AdmissionLimits::from(config))
    }

    pub fn limits(&self) -> &AdmissionLimits {
        &self.limits
    }

    /// Number of callers currently held in the registry.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    fn window_start(&self, now: SystemTime) -> SystemTime {
        now.checked_sub(self.limits.window).unwrap_or(UNIX_EPOCH)
    }

    /// Decide whether `caller_id` may make a call now, recording it if so.
    pub fn check_limit(&self, caller_id: &str) -> AdmissionDecision {
        let now = self.clock.now();
        let window_start = self.window_start(now);
        let limits = self.limits;

        let decision = {
            let mut entry = self
                .clients
                .entry(caller_id.to_string())
                .or_insert_with(|| ClientState::new(limits.burst_capacity));
            let state = entry.value_mut();

            state.trim(window_start);
            state.refill(now, limits.burst_capacity, limits.refill_interval);

            if state.burst_tokens() == 0 {
                AdmissionDecision::deny(
                    AdmissionReason::BurstExhausted,
                    now + limits.refill_interval,
                    ceil_secs(limits.refill_interval),
                )
            } else if state.request_count() >= limits.requests_per_minute as usize {
                let reset_time = state.oldest().map_or(now, |oldest| oldest + limits.window);
                let wait = reset_time.duration_since(now).unwrap_or_default();
                // The oldest entry is still counted at exactly `reset_time`.
                AdmissionDecision::deny(AdmissionReason::WindowExhausted, reset_time, ceil_secs(wait).max(1))
            } else {
                state.record(now);
                let left_in_window = (limits.requests_per_minute as usize)
                    .saturating_sub(state.request_count());
                let left_in_window = u32::try_from(left_in_window).unwrap_or(u32::MAX);
                AdmissionDecision::allow(
                    left_in_window.min(state.burst_tokens()),
                    window_start + limits.window,
                )
            }
        };

        metrics::record_admission(decision.reason.as_str());
        if decision.allowed {
            tracing::debug!(caller_id = %caller_id, remaining = decision.remaining, "Call admitted");
        } else {
            tracing::warn!(
                caller_id = %caller_id,
                reason = %decision.reason,
                retry_after_secs = ?decision.retry_after_secs,
                "Call rejected by admission control"
            );
        }
        decision
    }

    /// Current occupancy and credits for a caller, without changing anything.
    pub fn get_status(&self, caller_id: &str) -> ClientStatus {
        let now = self.clock.now();
        let snapshot = self.clients.get(caller_id).map(|entry| entry.value().clone());
        let tracked = snapshot.is_some();

        let mut state = snapshot.unwrap_or_else(|| ClientState::new(self.limits.burst_capacity));
        state.trim(self.window_start(now));
        state.refill(now, self.limits.burst_capacity, self.limits.refill_interval);

        ClientStatus {
            caller_id: caller_id.to_string(),
            tracked,
            requests_in_window: state.request_count(),
            burst_tokens: state.burst_tokens(),
            requests_per_minute: self.limits.requests_per_minute,
            burst_capacity: self.limits.burst_capacity,
        }
    }

    /// Aggregate counts across all tracked callers.
    pub fn get_global_stats(&self) -> GlobalStats {
        let window_start = self.window_start(self.clock.now());
        let mut active_clients = 0;
        let mut requests_in_window = 0;
        for entry in self.clients.iter() {
            active_clients += 1;
            requests_in_window += entry.value().count_since(window_start);
        }

        GlobalStats {
            active_clients,
            requests_in_window,
            requests_per_minute: self.limits.requests_per_minute,
            burst_capacity: self.limits.burst_capacity,
        }
    }

    /// Forget a caller entirely. Returns whether an entry existed.
    pub fn reset_client(&self, caller_id: &str) -> bool {
        let removed = self.clients.remove(caller_id).is_some();
        if removed {
            tracing::info!(caller_id = %caller_id, "Admission state reset");
            metrics::record_tracked_clients(self.clients.len());
        }
        removed
    }

    /// Drop callers with no request inside the idle timeout. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let cutoff = now.checked_sub(self.limits.idle_timeout).unwrap_or(UNIX_EPOCH);

        let mut removed = 0;
        self.clients.retain(|_, state| {
            let keep = !state.is_idle_since(cutoff);
            if !keep {
                removed += 1;
            }
            keep
        });

        let remaining = self.clients.len();
        metrics::record_tracked_clients(remaining);
        if removed > 0 {
            tracing::debug!(removed, remaining, "Swept idle callers");
        }
        removed
    }
}
