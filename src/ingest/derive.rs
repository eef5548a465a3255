//! Derived segment fields.
//!
//! Day-of-week and hour are taken from `start_time` in UTC, never the host
//! timezone. Speed is km/h rounded to two decimals, half away from zero.

use chrono::{DateTime, Datelike, Timelike};

use crate::ingest::model::{DerivedSegment, Segment};

/// Meters per second to kilometers per hour.
const MPS_TO_KPH: f64 = 3.6;

impl DerivedSegment {
    pub fn from_segment(segment: &Segment) -> Self {
        let (start_time_dow, start_time_hour) = utc_dow_and_hour(segment.start_time);
        Self {
            start_time_dow,
            start_time_hour,
            speed_kph: speed_kph(segment.length, segment.start_time, segment.end_time),
        }
    }
}

/// Day of week (0 = Sunday) and hour of day for an epoch timestamp in UTC.
///
/// Timestamps chrono cannot represent fall back to the epoch itself
/// (Thursday, hour 0); such values are rejected later by the column range
/// checks anyway.
pub fn utc_dow_and_hour(epoch_secs: i64) -> (u8, u8) {
    let Some(at) = DateTime::from_timestamp(epoch_secs, 0) else {
        return (4, 0);
    };
    (
        at.weekday().num_days_from_sunday() as u8,
        at.hour() as u8,
    )
}

/// Average speed over the segment in km/h.
pub fn speed_kph(length_m: f64, start_time: i64, end_time: i64) -> f64 {
    let seconds = end_time.saturating_sub(start_time);
    if seconds <= 0 {
        return 0.0;
    }
    round_to_hundredths(length_m / seconds as f64 * MPS_TO_KPH)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
