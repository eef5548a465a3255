//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Job (accepted TCP stream)
//!     → server.rs (hyper HTTP/1, request ID, tracing)
//!     → request.rs (method, action, JSON document)
//!     → ingest (validate, derive, persist)
//!     → response.rs ({"response": ...})
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::RequestParser;
pub use server::IngestHandler;
