//! Window-bounded occurrence enumeration
//!
//! A schedule is mapped into its numeric domain (see [`super::numeric`]) and
//! the window bounds are turned into the first and last iteration index that
//! fall inside the window. Occurrence `k` sits at `begin + k * step`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::numeric::{from_numeric, step, to_numeric};
use super::occurrence::{OccurrenceChanges, OccurrenceSummary};
use super::rule::{RecurrenceRule, Schedule};

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("Invalid month {0} (expected 1-12)")]
    InvalidMonth(u32),

    #[error("Year {0} is out of range")]
    InvalidYear(i32),
}

/// A half-open date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The calendar month `month` (1-12) of `year`
    pub fn month(year: i32, month: u32) -> Result<Self, WindowError> {
        if !(1..=12).contains(&month) {
            return Err(WindowError::InvalidMonth(month));
        }
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or(WindowError::InvalidYear(year))?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or(WindowError::InvalidYear(year))?;
        Ok(Self { start, end })
    }

    /// The calendar year `year`
    pub fn year(year: i32) -> Result<Self, WindowError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(WindowError::InvalidYear(year))?;
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or(WindowError::InvalidYear(year))?;
        Ok(Self { start, end })
    }

    /// The month containing `date`
    pub fn month_of(date: NaiveDate) -> Result<Self, WindowError> {
        Self::month(date.year(), date.month())
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Integer division rounded to the nearest integer, ties away from zero
fn div_round(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if 2 * remainder.abs() >= denominator.abs() {
        quotient + numerator.signum() * denominator.signum()
    } else {
        quotient
    }
}

/// Index of the first occurrence at or after `window_start`, or `None` if
/// the series starts after the window.
pub fn first_iteration(window_start: i64, window_end: i64, begin: i64, diff: i64) -> Option<i64> {
    if diff <= 0 || begin > window_end {
        return None;
    }
    if begin > window_start {
        return Some(0);
    }
    let k = div_round(window_start - begin, diff);
    if begin + k * diff < window_start {
        Some(k + 1)
    } else {
        Some(k)
    }
}

/// Index of the last occurrence not after `min(end, window_end)`, or `None`
/// if the series starts after the window or ends before it.
pub fn last_iteration(
    window_start: i64,
    window_end: i64,
    begin: i64,
    end: Option<i64>,
    diff: i64,
) -> Option<i64> {
    if diff <= 0 || begin > window_end {
        return None;
    }
    if end.is_some_and(|end| end < window_start) {
        return None;
    }
    let valid_end = end.map_or(window_end, |end| end.min(window_end));
    let k = div_round(valid_end - begin, diff);
    if begin + k * diff > valid_end {
        Some(k - 1)
    } else {
        Some(k)
    }
}

/// Enumerates the occurrences of one schedule inside `window`, in ascending
/// iteration order.
pub fn occurrences(schedule: &Schedule, window: &Window) -> Vec<OccurrenceSummary> {
    if window.is_empty() {
        return Vec::new();
    }

    let kind = schedule.kind;
    let window_start = to_numeric(window.start, kind);
    let window_end = to_numeric(window.end, kind);
    let begin = to_numeric(schedule.anchor, kind);
    let end = schedule.end_date.map(|d| to_numeric(d, kind));
    let diff = step(kind, schedule.interval);

    let (Some(first), Some(last)) = (
        first_iteration(window_start, window_end, begin, diff),
        last_iteration(window_start, window_end, begin, end, diff),
    ) else {
        return Vec::new();
    };

    (first..=last)
        .filter_map(|k| from_numeric(begin + k * diff, schedule))
        .map(|date| OccurrenceSummary {
            rule_id: schedule.rule_id,
            date,
            kind,
            interval: schedule.interval,
            end_date: schedule.end_date,
            changes: OccurrenceChanges::default(),
        })
        .collect()
}

/// Enumerates the occurrences of every rule, rule by rule
pub fn occurrences_for_rules(rules: &[RecurrenceRule], window: &Window) -> Vec<OccurrenceSummary> {
    rules
        .iter()
        .flat_map(RecurrenceRule::schedules)
        .flat_map(|schedule| occurrences(&schedule, window))
        .collect()
}
