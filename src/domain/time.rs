//! Time-of-day and calendar date helpers
//!
//! Task times are stored as `hh:mm` (seconds are accepted on input and
//! dropped). Dates are plain calendar dates; whenever a date needs a numeric
//! representation it is taken at UTC midnight.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

#[derive(Debug, Error, PartialEq)]
pub enum TimeError {
    #[error("wrong time format '{0}' (expected: hh:mm[:ss])")]
    Format(String),

    #[error("time out of range: {0}")]
    OutOfRange(String),
}

/// A time of day with minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskTime {
    hour: u8,
    minute: u8,
}

impl TaskTime {
    /// Creates a time, returning `None` if out of range
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Formats with seconds, as written to the database
    pub fn to_db_string(&self) -> String {
        format!("{:02}:{:02}:00", self.hour, self.minute)
    }
}

impl fmt::Display for TaskTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TaskTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(TimeError::Format(s.to_string()));
        }

        let hour: u8 = parts[0]
            .parse()
            .map_err(|_| TimeError::Format(s.to_string()))?;
        let minute: u8 = parts[1]
            .parse()
            .map_err(|_| TimeError::Format(s.to_string()))?;
        if let Some(seconds) = parts.get(2) {
            seconds
                .split('.')
                .next()
                .and_then(|sec| sec.parse::<u8>().ok())
                .filter(|sec| *sec < 60)
                .ok_or_else(|| TimeError::Format(s.to_string()))?;
        }

        Self::new(hour, minute).ok_or_else(|| TimeError::OutOfRange(s.to_string()))
    }
}

impl From<NaiveTime> for TaskTime {
    fn from(time: NaiveTime) -> Self {
        // NaiveTime is always in range
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl Serialize for TaskTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Milliseconds since the Unix epoch at UTC midnight of `date`
pub fn utc_midnight_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Calendar date (UTC) of an epoch-millisecond value
pub fn date_from_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

/// Builds a date the way a lenient calendar does: `day` is counted from the
/// first of the month, so a day past the month's end rolls into the next
/// month (January 31st plus one month lands in early March).
pub fn rolled_date(year: i32, month0: u32, day: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
    first.checked_add_days(chrono::Days::new(u64::from(day.saturating_sub(1))))
}

/// Zero-based weekday index of `date`, Monday = 0 … Sunday = 6
pub fn weekday_index(date: NaiveDate) -> usize {
    use chrono::Datelike;
    date.weekday().num_days_from_monday() as usize
}
