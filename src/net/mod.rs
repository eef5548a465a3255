//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → acceptor.rs (accept loop, submit to worker queue)
//!     → connection.rs (Job: stream + peer + connection ID)
//!     → Hand off to a worker and the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Plain TCP only
//! - The bounded worker queue is the only admission control

pub mod acceptor;
pub mod connection;
pub mod listener;

pub use acceptor::run_acceptor;
pub use connection::{ConnectionId, Job};
pub use listener::{Listener, ListenerError};
