//! Numeric date domains
//!
//! Stepping is done on integers rather than dates. Each recurrence kind has
//! its own domain:
//!
//! | Kind | Domain | Step |
//! |------|--------|------|
//! | daily | epoch ms at UTC midnight | `interval` days |
//! | weekly | epoch ms at UTC midnight | `interval * 7` days |
//! | day of week | epoch ms at UTC midnight | 7 days (mask ignored) |
//! | monthly | `year * 12 + month0` | `interval` |
//! | yearly | `year` | `interval` |

use chrono::{Datelike, NaiveDate};

use super::rule::{RecurrenceKind, Schedule};
use super::time::{date_from_millis, rolled_date, utc_midnight_millis, MS_PER_DAY};

/// Maps a calendar date into the numeric domain of `kind`
pub fn to_numeric(date: NaiveDate, kind: RecurrenceKind) -> i64 {
    match kind {
        RecurrenceKind::Daily | RecurrenceKind::Weekly | RecurrenceKind::DayOfWeek => {
            utc_midnight_millis(date)
        }
        RecurrenceKind::Monthly => i64::from(date.year()) * 12 + i64::from(date.month0()),
        RecurrenceKind::Yearly => i64::from(date.year()),
    }
}

/// Distance between two consecutive occurrences in the numeric domain
pub fn step(kind: RecurrenceKind, interval: u32) -> i64 {
    let interval = i64::from(interval);
    match kind {
        RecurrenceKind::Daily => interval * MS_PER_DAY,
        RecurrenceKind::Weekly => interval * 7 * MS_PER_DAY,
        RecurrenceKind::DayOfWeek => 7 * MS_PER_DAY,
        RecurrenceKind::Monthly | RecurrenceKind::Yearly => interval,
    }
}

/// Maps a numeric value back to a calendar date.
///
/// Monthly and yearly occurrences copy the day (and for yearly the month)
/// from the schedule's anchor without clamping; a day that does not exist in
/// the target month rolls over into the next one.
pub fn from_numeric(value: i64, schedule: &Schedule) -> Option<NaiveDate> {
    match schedule.kind {
        RecurrenceKind::Daily | RecurrenceKind::Weekly | RecurrenceKind::DayOfWeek => {
            date_from_millis(value)
        }
        RecurrenceKind::Monthly => {
            let year = value.div_euclid(12);
            let month0 = value - year * 12;
            rolled_date(
                i32::try_from(year).ok()?,
                u32::try_from(month0).ok()?,
                schedule.anchor.day(),
            )
        }
        RecurrenceKind::Yearly => rolled_date(
            i32::try_from(value).ok()?,
            schedule.anchor.month0(),
            schedule.anchor.day(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TaskId;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn schedule(kind: RecurrenceKind, anchor: &str) -> Schedule {
        Schedule {
            rule_id: TaskId::new(0),
            kind,
            interval: 1,
            anchor: date(anchor),
            end_date: None,
        }
    }

    #[test]
    fn monthly_domain_counts_months() {
        assert_eq!(to_numeric(date("2022-01-15"), RecurrenceKind::Monthly), 2022 * 12);
        assert_eq!(to_numeric(date("2022-12-01"), RecurrenceKind::Monthly), 2022 * 12 + 11);
    }

    #[test]
    fn yearly_domain_is_year() {
        assert_eq!(to_numeric(date("2025-05-17"), RecurrenceKind::Yearly), 2025);
    }

    #[test]
    fn daily_domains_are_epoch_millis() {
        let d = date("2022-01-01");
        assert_eq!(to_numeric(d, RecurrenceKind::Daily), 1_640_995_200_000);
        assert_eq!(to_numeric(d, RecurrenceKind::Weekly), 1_640_995_200_000);
        assert_eq!(to_numeric(d, RecurrenceKind::DayOfWeek), 1_640_995_200_000);
    }

    #[test]
    fn steps_per_kind() {
        assert_eq!(step(RecurrenceKind::Daily, 7), 7 * MS_PER_DAY);
        assert_eq!(step(RecurrenceKind::Weekly, 2), 14 * MS_PER_DAY);
        assert_eq!(step(RecurrenceKind::Monthly, 3), 3);
        assert_eq!(step(RecurrenceKind::Yearly, 1), 1);
    }

    #[test]
    fn day_of_week_step_ignores_mask() {
        assert_eq!(step(RecurrenceKind::DayOfWeek, 0b111_1111), 7 * MS_PER_DAY);
        assert_eq!(step(RecurrenceKind::DayOfWeek, 1), 7 * MS_PER_DAY);
    }

    #[test]
    fn monthly_reverse_copies_anchor_day() {
        let s = schedule(RecurrenceKind::Monthly, "2021-05-17");
        // November is month0 10
        assert_eq!(from_numeric(2022 * 12 + 10, &s), Some(date("2022-11-17")));
        assert_eq!(from_numeric(2022 * 12 + 11, &s), Some(date("2022-12-17")));
        assert_eq!(from_numeric(2023 * 12, &s), Some(date("2023-01-17")));
    }

    #[test]
    fn yearly_reverse_copies_anchor_month_and_day() {
        let s = schedule(RecurrenceKind::Yearly, "2023-05-17");
        assert_eq!(from_numeric(2025, &s), Some(date("2025-05-17")));
    }

    #[test]
    fn daily_reverse_round_trips() {
        let s = schedule(RecurrenceKind::Daily, "2022-01-01");
        let d = date("2022-01-28");
        assert_eq!(from_numeric(to_numeric(d, RecurrenceKind::Daily), &s), Some(d));
    }

    // Known limitation: the anchor day is not clamped to the month length.
    #[test]
    fn monthly_reverse_rolls_over_short_months() {
        let s = schedule(RecurrenceKind::Monthly, "2022-01-31");
        assert_eq!(from_numeric(2022 * 12 + 1, &s), Some(date("2022-03-03")));
        assert_eq!(from_numeric(2022 * 12 + 3, &s), Some(date("2022-05-01")));
    }

    #[test]
    fn yearly_reverse_rolls_over_leap_day() {
        let s = schedule(RecurrenceKind::Yearly, "2020-02-29");
        assert_eq!(from_numeric(2021, &s), Some(date("2021-03-01")));
        assert_eq!(from_numeric(2024, &s), Some(date("2024-02-29")));
    }
}
