//! Conversions between runtime temporal values and the wire millisecond
//! domain.
//!
//! DateTime and Date values are stored on the wire as milliseconds since
//! 0001-01-01T00:00:00Z; at runtime they are UTC instants measured from the
//! unix epoch, so the two domains differ by a fixed offset. Time values are
//! milliseconds within a day, TimeSpan values signed millisecond durations.

use chrono::{DateTime, NaiveTime, TimeDelta, Timelike, Utc};

use crate::error::{FormatError, Result};

/// Milliseconds between 0001-01-01T00:00:00Z and the unix epoch.
pub const EPOCH_OFFSET_MILLIS: i64 = 62_135_596_800_000;

/// The earliest supported instant, 1583-01-01T00:00:00Z, in unix-epoch
/// milliseconds. Dates before the Gregorian calendar are rejected.
pub const MIN_DATETIME_MILLIS: i64 = -12_212_553_600_000;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Converts a unix-epoch millisecond instant to the wire domain, rejecting
/// instants before [`MIN_DATETIME_MILLIS`].
pub fn datetime_millis_to_wire(millis: i64) -> Result<i64> {
    if millis < MIN_DATETIME_MILLIS {
        return Err(FormatError::DateOutOfRange { millis }.into());
    }
    Ok(millis + EPOCH_OFFSET_MILLIS)
}

/// Converts a wire-domain millisecond value back to a unix-epoch instant,
/// applying the same range gate as the writer.
pub fn wire_to_datetime_millis(raw: i64) -> Result<i64> {
    let millis = raw - EPOCH_OFFSET_MILLIS;
    if millis < MIN_DATETIME_MILLIS {
        return Err(FormatError::DateOutOfRange { millis }.into());
    }
    Ok(millis)
}

/// Reduces a millisecond value into the time-of-day interval
/// [0, [`MILLIS_PER_DAY`]), wrapping negative values by one day.
pub fn normalize_time_millis(millis: i64) -> i64 {
    let reduced = millis % MILLIS_PER_DAY;
    if reduced >= 0 {
        reduced
    } else {
        MILLIS_PER_DAY + reduced
    }
}

/// Converts a unix-epoch millisecond instant to a chrono UTC instant.
pub fn datetime_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| FormatError::DateOutOfRange { millis }.into())
}

/// Converts a chrono UTC instant to unix-epoch milliseconds, truncating any
/// sub-millisecond precision.
pub fn millis_from_datetime(value: &DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

/// Converts a normalized time-of-day millisecond value to a `NaiveTime`.
pub fn time_from_millis(millis: i64) -> Result<NaiveTime> {
    let normalized = normalize_time_millis(millis);
    let secs = (normalized / 1000) as u32;
    let nanos = ((normalized % 1000) * 1_000_000) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
        .ok_or_else(|| FormatError::DateOutOfRange { millis }.into())
}

/// Converts a `NaiveTime` to milliseconds within the day, truncating any
/// sub-millisecond precision.
pub fn millis_from_time(value: &NaiveTime) -> i64 {
    value.num_seconds_from_midnight() as i64 * 1000 + (value.nanosecond() / 1_000_000) as i64
}

/// Converts a signed millisecond duration to a `TimeDelta`.
pub fn timespan_from_millis(millis: i64) -> Result<TimeDelta> {
    TimeDelta::try_milliseconds(millis)
        .ok_or_else(|| FormatError::DateOutOfRange { millis }.into())
}

/// Converts a `TimeDelta` to whole milliseconds.
pub fn millis_from_timespan(value: &TimeDelta) -> i64 {
    value.num_milliseconds()
}
