//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound call (caller id)
//!     → controller.rs (trim window, refill burst, decide, record)
//!     → decision.rs (AdmissionDecision returned to the dispatcher)
//!
//! Housekeeping:
//!     sweeper.rs ticks every 60s
//!     → controller.sweep() drops callers idle for 300s
//! ```
//!
//! # Design Decisions
//! - State is per caller in a sharded map, never behind one global lock
//! - Time comes from an injected clock so behaviour is testable without sleeping
//! - No background work is hidden inside the controller; the sweeper is opt-in

pub mod controller;
pub mod decision;
pub mod state;
pub mod sweeper;

pub use controller::{AdmissionController, AdmissionLimits};
pub use decision::{AdmissionDecision, AdmissionReason, ClientStatus, GlobalStats};
pub use state::ClientState;
pub use sweeper::Sweeper;
