//! Weekday selection and day-of-week rule expansion
//!
//! A day-of-week rule stores which weekdays it recurs on as a 7-bit mask,
//! least significant bit first: bit 0 is Monday, bit 6 is Sunday.
//!
//! Expansion turns such a rule into one weekly schedule per selected weekday.
//! Each schedule is anchored on the first date of that weekday counted from
//! the rule's start date, so weekdays that come before the start date's
//! weekday are anchored in the following week:
//!
//! ```text
//! start = Thu 2022-10-13, mask = Mon..Fri
//!
//!   Mon 10-17   Tue 10-18   Wed 10-19   Thu 10-13   Fri 10-14
//!   (next week ........................) (anchor)   (same week)
//! ```
//!
//! Schedules are emitted in weekday order (Monday first), not in date order.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate, Weekday};
use serde::Serialize;

use super::rule::{RecurrenceRule, Schedule};
use super::time::weekday_index;

const WEEKDAY_NAMES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Set of weekdays, Monday = bit 0 … Sunday = bit 6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    pub const ALL_BITS: u8 = 0b111_1111;

    /// Creates a mask from raw bits; `None` if any bit above Sunday is set
    pub fn from_bits(bits: u8) -> Option<Self> {
        ((bits & !Self::ALL_BITS) == 0).then_some(Self(bits))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Decodes the mask into one flag per weekday, Monday first
    pub fn days(&self) -> [bool; 7] {
        let mut days = [false; 7];
        for (i, day) in days.iter_mut().enumerate() {
            *day = (self.0 & (1 << i)) != 0;
        }
        days
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.days()[weekday.num_days_from_monday() as usize]
    }

    pub fn with(self, weekday: Weekday) -> Self {
        Self(self.0 | 1 << weekday.num_days_from_monday())
    }

    pub fn monday(&self) -> bool {
        self.contains(Weekday::Mon)
    }

    pub fn tuesday(&self) -> bool {
        self.contains(Weekday::Tue)
    }

    pub fn wednesday(&self) -> bool {
        self.contains(Weekday::Wed)
    }

    pub fn thursday(&self) -> bool {
        self.contains(Weekday::Thu)
    }

    pub fn friday(&self) -> bool {
        self.contains(Weekday::Fri)
    }

    pub fn saturday(&self) -> bool {
        self.contains(Weekday::Sat)
    }

    pub fn sunday(&self) -> bool {
        self.contains(Weekday::Sun)
    }
}

impl fmt::Display for WeekdayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .days()
            .iter()
            .zip(WEEKDAY_NAMES)
            .filter(|(set, _)| **set)
            .map(|(_, name)| name)
            .collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for WeekdayMask {
    type Err = String;

    /// Parses a comma-separated list such as `mon,wed,fri`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .try_fold(WeekdayMask::empty(), |mask, part| {
                part.parse::<Weekday>()
                    .map(|day| mask.with(day))
                    .map_err(|_| format!("unknown weekday '{}'", part))
            })
    }
}

/// Expands a day-of-week rule into one schedule per selected weekday.
///
/// Each schedule keeps the rule's id, its mask (as the opaque interval) and
/// its end date. Any other kind of rule expands to nothing.
pub fn expand_day_of_week(rule: &RecurrenceRule) -> Vec<Schedule> {
    let Some(mask) = rule.weekdays() else {
        return Vec::new();
    };

    let start = rule.start_date;
    let start_day = weekday_index(start);

    let mut week = [start; 7];
    for (i, slot) in week.iter_mut().enumerate().take(start_day) {
        *slot = add_days(start, 7 - start_day + i);
    }
    for i in 0..(6 - start_day) {
        week[start_day + i + 1] = add_days(start, i + 1);
    }

    mask.days()
        .iter()
        .zip(week)
        .filter(|(selected, _)| **selected)
        .map(|(_, anchor)| Schedule {
            rule_id: rule.id,
            kind: rule.kind,
            interval: rule.interval,
            anchor,
            end_date: rule.end_date,
        })
        .collect()
}

fn add_days(date: NaiveDate, days: usize) -> NaiveDate {
    // At most 7 days; only fails at the very end of chrono's date range
    date.checked_add_days(Days::new(days as u64)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::RecurrenceKind;
    use crate::domain::task::TaskId;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn weekday_rule(start: &str, mask: u8) -> RecurrenceRule {
        RecurrenceRule::on_weekdays(
            TaskId::new(7),
            WeekdayMask::from_bits(mask).unwrap(),
            date(start),
            Some(date("2023-01-01")),
        )
    }

    #[test]
    fn mask_accessors() {
        let mask = WeekdayMask::from_bits(0b100_0101).unwrap();
        assert!(mask.monday());
        assert!(!mask.tuesday());
        assert!(mask.wednesday());
        assert!(!mask.thursday());
        assert!(!mask.friday());
        assert!(!mask.saturday());
        assert!(mask.sunday());
        assert_eq!(mask.days().iter().filter(|&&on| on).count(), 3);
    }

    #[test]
    fn mask_rejects_eighth_bit() {
        assert!(WeekdayMask::from_bits(0b1000_0000).is_none());
        assert!(WeekdayMask::from_bits(WeekdayMask::ALL_BITS).is_some());
    }

    #[test]
    fn mask_parse_and_display() {
        let mask: WeekdayMask = "mon, Wed,fri".parse().unwrap();
        assert_eq!(mask.bits(), 0b001_0101);
        assert_eq!(mask.to_string(), "mon,wed,fri");
        assert!("mon,funday".parse::<WeekdayMask>().is_err());
    }

    #[test]
    fn weekday_expansion_anchors_around_start() {
        // Thursday start, Monday to Friday selected
        let rule = weekday_rule("2022-10-13", 0b001_1111);
        let anchors: Vec<NaiveDate> = expand_day_of_week(&rule).iter().map(|s| s.anchor).collect();

        assert_eq!(
            anchors,
            vec![
                date("2022-10-17"),
                date("2022-10-18"),
                date("2022-10-19"),
                date("2022-10-13"),
                date("2022-10-14"),
            ]
        );
    }

    #[test]
    fn weekday_expansion_from_monday_stays_in_week() {
        let rule = weekday_rule("2022-10-17", WeekdayMask::ALL_BITS);
        let anchors: Vec<NaiveDate> = expand_day_of_week(&rule).iter().map(|s| s.anchor).collect();

        let expected: Vec<NaiveDate> = (17..=23)
            .map(|day| NaiveDate::from_ymd_opt(2022, 10, day).unwrap())
            .collect();
        assert_eq!(anchors, expected);
    }

    #[test]
    fn weekday_expansion_from_sunday_moves_everything_forward() {
        let rule = weekday_rule("2022-10-16", 0b100_0001);
        let anchors: Vec<NaiveDate> = expand_day_of_week(&rule).iter().map(|s| s.anchor).collect();

        assert_eq!(anchors, vec![date("2022-10-17"), date("2022-10-16")]);
    }

    #[test]
    fn schedules_carry_rule_metadata() {
        let rule = weekday_rule("2022-10-13", 0b000_0011);
        let schedules = expand_day_of_week(&rule);

        assert_eq!(schedules.len(), 2);
        for schedule in &schedules {
            assert_eq!(schedule.rule_id, TaskId::new(7));
            assert_eq!(schedule.kind, RecurrenceKind::DayOfWeek);
            assert_eq!(schedule.interval, 3);
            assert_eq!(schedule.end_date, Some(date("2023-01-01")));
        }
    }

    #[test]
    fn empty_mask_expands_to_nothing() {
        let rule = weekday_rule("2022-10-13", 0);
        assert!(expand_day_of_week(&rule).is_empty());
    }

    #[test]
    fn non_weekday_rule_expands_to_nothing() {
        let rule = RecurrenceRule::new(
            TaskId::new(1),
            RecurrenceKind::Weekly,
            31,
            date("2022-10-13"),
            None,
        );
        assert!(expand_day_of_week(&rule).is_empty());
    }
}
