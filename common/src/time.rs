//! Nanosecond timestamps with SQL-style parse and format

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by timestamp parsing
#[derive(Debug, Error)]
pub enum TimeError {
    /// The text matched neither `YYYY-MM-DD HH:MM:SS` nor `YYYY-MM-DD`
    #[error("invalid timestamp format: {0}")]
    InvalidFormat(String),
}

/// Timestamp in nanoseconds since the UNIX epoch
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Ts(pub i64);

impl Ts {
    /// Get current wall-clock timestamp
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    /// Create timestamp from nanoseconds
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Get timestamp as nanoseconds
    #[must_use]
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Parse a SQL-style timestamp: `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`
    /// (midnight UTC). Anything else is `TimeError::InvalidFormat`.
    pub fn from_sql(text: &str) -> Result<Self, TimeError> {
        let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").or_else(|_| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN))
        });
        let naive = naive.map_err(|_| TimeError::InvalidFormat(text.to_string()))?;
        naive
            .and_utc()
            .timestamp_nanos_opt()
            .map(Self)
            .ok_or_else(|| TimeError::InvalidFormat(text.to_string()))
    }

    /// Format as `YYYY-MM-DD HH:MM:SS` in UTC
    #[must_use]
    pub fn to_sql(&self) -> String {
        DateTime::<Utc>::from_timestamp_nanos(self.0)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
