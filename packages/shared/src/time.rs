//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        current_timestamp()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Get current Unix timestamp (milliseconds)
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

fn to_utc(timestamp_millis: i64) -> DateTime<Utc> {
    // Out-of-range values collapse to the epoch rather than failing a log line.
    DateTime::from_timestamp_millis(timestamp_millis).unwrap_or_default()
}

/// Convert Unix timestamp (milliseconds) to RFC 3339 format in UTC
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    to_utc(timestamp_millis).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format a Unix timestamp (milliseconds) as local wall-clock time, `HH:MM:SS`
pub fn format_time_of_day(timestamp_millis: i64) -> String {
    to_utc(timestamp_millis)
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string()
}
