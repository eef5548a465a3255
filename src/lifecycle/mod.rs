//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (service.rs):
//!     ServiceConfig + SessionConnector → bind → sessions → acceptor
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain queued connections → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: listener, then sessions, then accepting
//! - Ordered shutdown: stop accept, drain, close sessions

pub mod service;
pub mod shutdown;

pub use service::{IngestService, RunningService, ServiceError};
pub use shutdown::{wait_for_signal, Shutdown, ShutdownSignal};
