//! Recurrence rule model
//!
//! A rule repeats the task with the same id. Rules arrive from storage as
//! loosely typed rows and are decoded strictly: a row either becomes a
//! [`RecurrenceRule`] or is rejected with a [`ParseError`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::task::{TaskError, TaskId};
use super::time::TimeError;
use super::weekday::{expand_day_of_week, WeekdayMask};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unsupported recurrence kind code {0}")]
    UnsupportedKind(i64),

    #[error("Invalid interval {0} (must be at least 1)")]
    InvalidInterval(i64),

    #[error("Invalid weekday mask {0} (expected 7 bits)")]
    InvalidWeekdayMask(i64),

    #[error("Column '{column}' has wrong type or is missing: {message}")]
    Column {
        column: &'static str,
        message: String,
    },

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Invalid override changes: {0}")]
    Changes(String),
}

/// How a rule repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Weekly on a set of weekdays; never stored as a type code
    DayOfWeek,
}

impl RecurrenceKind {
    /// Maps a stored type code. Day-of-week rules are stored with a separate
    /// weekday mask, so only the four interval kinds have codes.
    pub fn from_code(code: i64) -> Result<Self, ParseError> {
        match code {
            0 => Ok(RecurrenceKind::Daily),
            1 => Ok(RecurrenceKind::Weekly),
            2 => Ok(RecurrenceKind::Monthly),
            3 => Ok(RecurrenceKind::Yearly),
            other => Err(ParseError::UnsupportedKind(other)),
        }
    }

    /// Stored type code; day-of-week rules are written as weekly
    pub fn code(&self) -> i64 {
        match self {
            RecurrenceKind::Daily => 0,
            RecurrenceKind::Weekly | RecurrenceKind::DayOfWeek => 1,
            RecurrenceKind::Monthly => 2,
            RecurrenceKind::Yearly => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::Yearly => "yearly",
            RecurrenceKind::DayOfWeek => "day_of_week",
        }
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "monthly" => Ok(RecurrenceKind::Monthly),
            "yearly" => Ok(RecurrenceKind::Yearly),
            "day_of_week" | "day-of-week" => Ok(RecurrenceKind::DayOfWeek),
            other => Err(format!("unknown recurrence kind '{}'", other)),
        }
    }
}

/// A raw rule row as read from storage, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRow {
    pub id: i64,
    pub code: i64,
    pub interval: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Weekday bitmask; when present the row is a day-of-week rule
    pub weekdays: Option<i64>,
}

/// A stored recurrence rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub id: TaskId,
    pub kind: RecurrenceKind,
    /// Step count, or the 7-bit weekday mask for [`RecurrenceKind::DayOfWeek`]
    pub interval: u32,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<RuleRow> for RecurrenceRule {
    type Error = ParseError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        let kind = RecurrenceKind::from_code(row.code)?;

        let (kind, interval) = match row.weekdays {
            Some(mask) => {
                let mask = u8::try_from(mask)
                    .ok()
                    .and_then(WeekdayMask::from_bits)
                    .ok_or(ParseError::InvalidWeekdayMask(mask))?;
                (RecurrenceKind::DayOfWeek, u32::from(mask.bits()))
            }
            None => {
                let interval = u32::try_from(row.interval)
                    .ok()
                    .filter(|i| *i >= 1)
                    .ok_or(ParseError::InvalidInterval(row.interval))?;
                (kind, interval)
            }
        };

        Ok(Self {
            id: TaskId::new(row.id),
            kind,
            interval,
            start_date: row.start_date,
            end_date: row.end_date,
        })
    }
}

impl RecurrenceRule {
    pub fn new(
        id: TaskId,
        kind: RecurrenceKind,
        interval: u32,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            kind,
            interval,
            start_date,
            end_date,
        }
    }

    /// Creates a day-of-week rule from a weekday selection
    pub fn on_weekdays(
        id: TaskId,
        weekdays: WeekdayMask,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self::new(
            id,
            RecurrenceKind::DayOfWeek,
            u32::from(weekdays.bits()),
            start_date,
            end_date,
        )
    }

    /// Weekday selection of a day-of-week rule
    pub fn weekdays(&self) -> Option<WeekdayMask> {
        if self.kind != RecurrenceKind::DayOfWeek {
            return None;
        }
        u8::try_from(self.interval).ok().and_then(WeekdayMask::from_bits)
    }

    /// Splits the rule into the schedules that are stepped through a window.
    /// Interval rules have exactly one; day-of-week rules have one per
    /// selected weekday.
    pub fn schedules(&self) -> Vec<Schedule> {
        match self.kind {
            RecurrenceKind::DayOfWeek => expand_day_of_week(self),
            _ => vec![Schedule {
                rule_id: self.id,
                kind: self.kind,
                interval: self.interval,
                anchor: self.start_date,
                end_date: self.end_date,
            }],
        }
    }
}

/// One steppable series: an anchor date advanced by a fixed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub rule_id: TaskId,
    pub kind: RecurrenceKind,
    /// Interval as stored on the rule; for day-of-week schedules this is the
    /// untouched weekday mask and is not used for stepping
    pub interval: u32,
    pub anchor: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn row(code: i64, interval: i64) -> RuleRow {
        RuleRow {
            id: 123,
            code,
            interval,
            start_date: date("2022-01-01"),
            end_date: Some(date("2022-02-01")),
            weekdays: None,
        }
    }

    #[test]
    fn parse_daily_row() {
        let rule = RecurrenceRule::try_from(row(0, 100)).unwrap();
        assert_eq!(
            rule,
            RecurrenceRule::new(
                TaskId::new(123),
                RecurrenceKind::Daily,
                100,
                date("2022-01-01"),
                Some(date("2022-02-01")),
            )
        );
    }

    #[test]
    fn parse_all_kind_codes() {
        let kinds: Vec<_> = (0..4)
            .map(|code| RecurrenceRule::try_from(row(code, 1)).unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                RecurrenceKind::Daily,
                RecurrenceKind::Weekly,
                RecurrenceKind::Monthly,
                RecurrenceKind::Yearly
            ]
        );
    }

    #[test]
    fn unknown_code_fails() {
        assert_eq!(
            RecurrenceRule::try_from(row(89, 1)),
            Err(ParseError::UnsupportedKind(89))
        );
        assert_eq!(
            RecurrenceRule::try_from(row(4, 1)),
            Err(ParseError::UnsupportedKind(4))
        );
    }

    #[test]
    fn non_positive_interval_fails() {
        assert_eq!(
            RecurrenceRule::try_from(row(0, -1)),
            Err(ParseError::InvalidInterval(-1))
        );
        assert_eq!(
            RecurrenceRule::try_from(row(2, 0)),
            Err(ParseError::InvalidInterval(0))
        );
    }

    #[test]
    fn end_date_is_optional() {
        let mut raw = row(3, 1);
        raw.end_date = None;
        assert_eq!(RecurrenceRule::try_from(raw).unwrap().end_date, None);
    }

    #[test]
    fn end_before_start_still_parses() {
        let mut raw = row(0, 1);
        raw.end_date = Some(date("1989-08-01"));
        assert!(RecurrenceRule::try_from(raw).is_ok());
    }

    #[test]
    fn weekday_column_makes_day_of_week_rule() {
        let mut raw = row(1, 1);
        raw.weekdays = Some(0b001_1111);
        let rule = RecurrenceRule::try_from(raw).unwrap();

        assert_eq!(rule.kind, RecurrenceKind::DayOfWeek);
        assert_eq!(rule.interval, 31);
        assert_eq!(rule.weekdays().map(|w| w.bits()), Some(31));
    }

    #[test]
    fn weekday_mask_out_of_range_fails() {
        let mut raw = row(1, 1);
        raw.weekdays = Some(200);
        assert_eq!(
            RecurrenceRule::try_from(raw),
            Err(ParseError::InvalidWeekdayMask(200))
        );
    }

    #[test]
    fn interval_rule_has_single_schedule() {
        let rule = RecurrenceRule::try_from(row(2, 3)).unwrap();
        let schedules = rule.schedules();

        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].anchor, rule.start_date);
        assert_eq!(schedules[0].interval, 3);
        assert_eq!(schedules[0].kind, RecurrenceKind::Monthly);
    }

    #[test]
    fn kind_names() {
        assert_eq!("Monthly".parse::<RecurrenceKind>(), Ok(RecurrenceKind::Monthly));
        assert_eq!(RecurrenceKind::DayOfWeek.to_string(), "day_of_week");
        assert!("hourly".parse::<RecurrenceKind>().is_err());
    }
}
