//! Report, segment and row types.

use serde::Deserialize;
use serde_json::Value;

use crate::error::IngestError;

/// One request's worth of telemetry.
///
/// Segments stay as raw JSON until the processor reaches them so that a
/// malformed element only fails once every segment before it has been
/// inserted. The segment array is borrowed from the request document.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentReport<'a> {
    /// Opaque source identifier, stored as text.
    pub provider: String,
    /// Travel mode shared by every segment, e.g. "auto".
    pub mode: String,
    pub segments: &'a [Value],
}

impl<'a> SegmentReport<'a> {
    /// Extract the top-level fields. Fails before any segment is looked at.
    pub fn from_document(document: &'a Value) -> Result<Self, IngestError> {
        let provider = match document.get("provider") {
            Some(Value::String(provider)) => provider.clone(),
            Some(other) => other.to_string(),
            None => return Err(IngestError::MissingField("provider")),
        };

        let mode = match document.get("mode") {
            Some(Value::String(mode)) => mode.clone(),
            Some(_) => {
                return Err(IngestError::InvalidField {
                    field: "mode",
                    expected: "a string",
                })
            }
            None => return Err(IngestError::MissingField("mode")),
        };

        let segments = match document.get("segments") {
            Some(Value::Array(segments)) => segments.as_slice(),
            Some(_) => {
                return Err(IngestError::InvalidField {
                    field: "segments",
                    expected: "an array",
                })
            }
            None => return Err(IngestError::MissingField("segments")),
        };

        Ok(Self {
            provider,
            mode,
            segments,
        })
    }
}

/// A single traversed path fragment as reported by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Segment {
    pub segment_id: i64,
    #[serde(default)]
    pub prev_segment_id: Option<i64>,
    /// Epoch seconds, UTC.
    pub start_time: i64,
    /// Epoch seconds, UTC.
    pub end_time: i64,
    /// Meters.
    pub length: f64,
}

impl Segment {
    pub fn from_value(index: usize, value: &Value) -> Result<Self, IngestError> {
        Segment::deserialize(value).map_err(|source| IngestError::InvalidSegment { index, source })
    }
}

/// Fields computed from a [`Segment`], never client supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedSegment {
    /// 0 = Sunday.
    pub start_time_dow: u8,
    pub start_time_hour: u8,
    pub speed_kph: f64,
}

/// One row of the `segments` table, with the column widths of the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRow {
    pub segment_id: i64,
    pub prev_segment_id: Option<i64>,
    pub mode: String,
    pub start_time: i32,
    pub start_time_dow: i16,
    pub start_time_hour: i16,
    pub end_time: i32,
    pub length: i32,
    pub speed: f64,
    pub provider: String,
}

impl PersistedRow {
    /// Combine report-wide fields with one segment, checking column ranges.
    pub fn build(
        index: usize,
        report: &SegmentReport<'_>,
        segment: &Segment,
        derived: &DerivedSegment,
    ) -> Result<Self, IngestError> {
        Ok(Self {
            segment_id: segment.segment_id,
            prev_segment_id: segment.prev_segment_id,
            mode: report.mode.clone(),
            start_time: narrow(index, "start_time", segment.start_time)?,
            start_time_dow: i16::from(derived.start_time_dow),
            start_time_hour: i16::from(derived.start_time_hour),
            end_time: narrow(index, "end_time", segment.end_time)?,
            length: length_meters(index, segment.length)?,
            speed: derived.speed_kph,
            provider: report.provider.clone(),
        })
    }
}

fn narrow(index: usize, field: &'static str, value: i64) -> Result<i32, IngestError> {
    i32::try_from(value).map_err(|_| IngestError::OutOfRange {
        index,
        field,
        value: value as f64,
    })
}

fn length_meters(index: usize, length: f64) -> Result<i32, IngestError> {
    let rounded = length.round();
    if rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX) {
        Ok(rounded as i32)
    } else {
        Err(IngestError::OutOfRange {
            index,
            field: "length",
            value: length,
        })
    }
}
