//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, trace span, timeout)
//!     → request.rs (resolve caller identity)
//!     → service (validate → admission → upstream)
//!     → response.rs (map errors to status codes)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{CallerId, X_CALLER_ID};
pub use server::{AppState, HttpServer};
