//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation that may fail transiently (startup database connect):
//!     → retries.rs (policy: delay, attempt limit; loop + log)
//!     → backoff.rs (delay per attempt: fixed or exponential, optional jitter)
//! ```
//!
//! # Design Decisions
//! - Policies are values passed in by the caller, never inline sleeps
//! - Request-path inserts are never retried; the client resubmits

pub mod backoff;
pub mod retries;

pub use retries::{retry, RetryPolicy};
