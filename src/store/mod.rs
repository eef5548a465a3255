//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     schema.rs (connect with retry → ensure table + indexes)
//!
//! Per worker:
//!     SessionConnector::connect → session.rs (connection + prepared insert)
//!     → owned by exactly one worker for the life of the service
//!
//! Per request:
//!     processor → SegmentStore::insert (× segments) → commit | rollback
//! ```
//!
//! # Design Decisions
//! - Processing only sees the `SegmentStore` trait, so the pool and the
//!   HTTP path run unchanged against any store implementation
//! - A session is never shared; no locking beyond what the database does
//! - Connection loss mid-life is not repaired; the worker keeps failing
//!   requests until the process is restarted

pub mod schema;
pub mod session;

use async_trait::async_trait;
use thiserror::Error;

use crate::ingest::PersistedRow;

pub use schema::{bootstrap_schema, BootstrapError, SchemaStatus};
pub use session::{PgSessionConnector, WorkerSession};

/// Name of the table every row lands in.
pub const SEGMENTS_TABLE: &str = "segments";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("insert statement has not been prepared")]
    StatementMissing,
}

/// Write side of one worker session.
#[async_trait]
pub trait SegmentStore: Send {
    /// Execute the insert for one row inside the current transaction.
    async fn insert(&mut self, row: &PersistedRow) -> Result<(), StoreError>;

    /// Make every row inserted since the last commit/rollback durable.
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard every row inserted since the last commit/rollback.
    async fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Opens the session a worker owns for its lifetime.
#[async_trait]
pub trait SessionConnector: Send + Sync + 'static {
    type Session: SegmentStore + 'static;

    async fn connect(&self, worker: usize) -> Result<Self::Session, StoreError>;
}
