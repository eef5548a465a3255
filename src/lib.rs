//! Segment telemetry datastore library

pub mod config;
pub mod error;
pub mod http;
pub mod ingest;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pool;
pub mod resilience;
pub mod store;

pub use config::schema::ServiceConfig;
pub use error::IngestError;
pub use http::IngestHandler;
pub use lifecycle::{IngestService, RunningService, Shutdown};
pub use store::{PgSessionConnector, SegmentStore, SessionConnector};
