//! Segment report ingestion.
//!
//! # Data Flow
//! ```text
//! JSON document (from http::request)
//!     → model.rs (SegmentReport: provider, mode, raw segments)
//!     → per segment: model.rs (Segment) → derive.rs (dow, hour, speed)
//!     → model.rs (PersistedRow, column range checks)
//!     → processor.rs (insert via SegmentStore, commit/rollback)
//! ```

pub mod derive;
pub mod model;
pub mod processor;

pub use model::{DerivedSegment, PersistedRow, Segment, SegmentReport};
pub use processor::{ProcessOutcome, SegmentReportProcessor};
