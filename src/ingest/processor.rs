//! Segment report processing.
//!
//! # Responsibilities
//! - Extract report-wide fields, then walk segments in array order
//! - Derive day-of-week, hour and speed for each segment
//! - Insert one row per segment through the worker's session
//! - Close the request transaction exactly once, on success and on failure
//!
//! # Transaction Boundary
//! ```text
//! extract provider/mode/segments ──fail──▶ finish (nothing pending) → error
//!         │
//!         ▼
//! for each segment: decode → derive → build row → insert
//!         │                    └──fail at segment k──┐
//!         ▼                                          ▼
//!      commit → ok                Partial: commit rows 0..k → error
//!                                 Atomic:  rollback        → error
//! ```

use serde_json::Value;

use crate::config::CommitPolicy;
use crate::error::IngestError;
use crate::ingest::model::{DerivedSegment, PersistedRow, Segment, SegmentReport};
use crate::observability::metrics;
use crate::store::SegmentStore;

/// Result of a fully successful request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub rows_written: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentReportProcessor {
    policy: CommitPolicy,
}

impl SegmentReportProcessor {
    pub fn new(policy: CommitPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    /// Validate, transform and persist one report.
    pub async fn process<S>(&self, document: &Value, store: &mut S) -> Result<ProcessOutcome, IngestError>
    where
        S: SegmentStore + ?Sized,
    {
        let mut rows_written = 0;
        let inserted = insert_all(document, store, &mut rows_written).await;

        let finished = match (&inserted, self.policy) {
            (Err(_), CommitPolicy::Atomic) => store.rollback().await,
            _ => store.commit().await,
        };

        match (inserted, finished) {
            (Ok(()), Ok(())) => {
                metrics::record_rows_inserted(rows_written);
                Ok(ProcessOutcome { rows_written })
            }
            (Ok(()), Err(e)) => Err(e.into()),
            (Err(e), finished) => {
                if let Err(finish_error) = finished {
                    tracing::warn!(error = %finish_error, "Failed to close transaction after request error");
                } else {
                    let kept = self.rows_kept_after(&e, rows_written);
                    if kept > 0 {
                        metrics::record_rows_inserted(kept);
                        tracing::warn!(
                            rows_committed = kept,
                            error = %e,
                            "Request failed after earlier segments were committed"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Rows that survive a failed request once the transaction is closed.
    ///
    /// A database error aborts the open transaction, so the closing COMMIT
    /// keeps nothing even under the partial policy.
    fn rows_kept_after(&self, error: &IngestError, rows_written: usize) -> usize {
        match (self.policy, error) {
            (CommitPolicy::Atomic, _) | (_, IngestError::Store(_)) => 0,
            (CommitPolicy::Partial, _) => rows_written,
        }
    }
}

async fn insert_all<S>(document: &Value, store: &mut S, rows_written: &mut usize) -> Result<(), IngestError>
where
    S: SegmentStore + ?Sized,
{
    let report = SegmentReport::from_document(document)?;

    for (index, value) in report.segments.iter().enumerate() {
        let segment = Segment::from_value(index, value)?;
        let derived = DerivedSegment::from_segment(&segment);
        let row = PersistedRow::build(index, &report, &segment, &derived)?;
        store.insert(&row).await?;
        *rows_written += 1;
    }

    Ok(())
}
