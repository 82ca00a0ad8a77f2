//! Admission outcomes and read-only views of the registry.

use std::fmt;
use std::time::SystemTime;

use serde::Serialize;

use crate::clock::serialize_epoch_millis;

/// Why a check was allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionReason {
    /// Within both limits.
    Ok,
    /// No burst credits left.
    BurstExhausted,
    /// Sliding window already full.
    WindowExhausted,
}

impl AdmissionReason {
    /// Stable snake_case label, used for metrics and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::BurstExhausted => "burst_exhausted",
            Self::WindowExhausted => "window_exhausted",
        }
    }
}

impl fmt::Display for AdmissionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionDecision {
    /// Whether the call may proceed.
    pub allowed: bool,
    /// Which rule decided.
    pub reason: AdmissionReason,
    /// Calls still available right now.
    pub remaining: u32,
    /// When the limiting condition clears (epoch milliseconds on the wire).
    #[serde(serialize_with = "serialize_epoch_millis")]
    pub reset_time: SystemTime,
    /// Whole seconds to wait before retrying; only set on denial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl AdmissionDecision {
    pub(crate) fn allow(remaining: u32, reset_time: SystemTime) -> Self {
        Self {
            allowed: true,
            reason: AdmissionReason::Ok,
            remaining,
            reset_time,
            retry_after_secs: None,
        }
    }

    pub(crate) fn deny(reason: AdmissionReason, reset_time: SystemTime, retry_after_secs: u64) -> Self {
        Self {
            allowed: false,
            reason,
            remaining: 0,
            reset_time,
            retry_after_secs: Some(retry_after_secs),
        }
    }
}

/// Snapshot of one caller's state, computed without mutating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientStatus {
    pub caller_id: String,
    /// False when the registry holds no entry for this caller.
    pub tracked: bool,
    pub requests_in_window: usize,
    pub burst_tokens: u32,
    pub requests_per_minute: u32,
    pub burst_capacity: u32,
}

/// Aggregate view across all tracked callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub active_clients: usize,
    pub requests_in_window: usize,
    pub requests_per_minute: u32,
    pub burst_capacity: u32,
}
