//! Exclusion and override reconciliation
//!
//! Generated occurrences are matched against the two per-occurrence tables
//! on the exact `(rule id, date)` pair. Excluded occurrences are dropped;
//! overridden ones receive the override's changes.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use super::occurrence::{ExclusionEntry, OccurrenceChanges, OccurrenceSummary, OverrideEntry};
use super::task::TaskId;

/// Removes excluded occurrences, then copies override changes onto the
/// survivors. Order of the input is preserved.
pub fn reconcile(
    occurrences: Vec<OccurrenceSummary>,
    exclusions: &[ExclusionEntry],
    overrides: &[OverrideEntry],
) -> Vec<OccurrenceSummary> {
    let excluded: HashSet<(TaskId, NaiveDate)> = exclusions
        .iter()
        .map(|entry| (entry.rule_id, entry.date))
        .collect();

    let changes: HashMap<(TaskId, NaiveDate), &OccurrenceChanges> = overrides
        .iter()
        .map(|entry| ((entry.rule_id, entry.date), &entry.changes))
        .collect();

    occurrences
        .into_iter()
        .filter(|occurrence| !excluded.contains(&occurrence.key()))
        .map(|mut occurrence| {
            if let Some(found) = changes.get(&occurrence.key()) {
                occurrence.changes = (*found).clone();
            }
            occurrence
        })
        .collect()
}

/// Distinct rule ids of a batch, in first-seen order
pub fn distinct_rule_ids(occurrences: &[OccurrenceSummary]) -> Vec<TaskId> {
    let mut seen = HashSet::new();
    occurrences
        .iter()
        .map(|occurrence| occurrence.rule_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::occurrence::Patch;
    use crate::domain::rule::{RecurrenceKind, RecurrenceRule};
    use crate::domain::time::TaskTime;
    use crate::domain::window::{occurrences_for_rules, Window};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn time(s: &str) -> TaskTime {
        s.parse().unwrap()
    }

    fn daily_123() -> Vec<OccurrenceSummary> {
        let rule = RecurrenceRule::new(
            TaskId::new(123),
            RecurrenceKind::Daily,
            4,
            date("2022-01-01"),
            None,
        );
        occurrences_for_rules(&[rule], &Window::new(date("2022-01-01"), date("2022-02-01")))
    }

    #[test]
    fn exclusion_and_override_for_same_series() {
        let exclusions = [ExclusionEntry::new(TaskId::new(123), date("2022-01-05"))];
        let overrides = [OverrideEntry::new(TaskId::new(123), date("2022-01-01"))
            .start_time(Some(time("14:00")))
            .end_time(Some(time("16:00")))];

        let before = daily_123();
        let after = reconcile(before.clone(), &exclusions, &overrides);

        assert_eq!(after.len(), before.len() - 1);
        assert!(after.iter().all(|o| o.date != date("2022-01-05")));

        let first = &after[0];
        assert_eq!(first.date, date("2022-01-01"));
        assert_eq!(first.changes.start_time, Patch::Value(time("14:00")));
        assert_eq!(first.changes.end_time, Patch::Value(time("16:00")));
        assert!(first.changes.description.is_unset());

        assert!(after[1..].iter().all(|o| o.changes.is_empty()));
    }

    #[test]
    fn override_without_matching_occurrence_has_no_effect() {
        // 2022-01-02 is not on the every-4-days series
        let overrides = [OverrideEntry::new(TaskId::new(123), date("2022-01-02"))
            .description(Some("moved".to_string()))];

        let before = daily_123();
        assert_eq!(reconcile(before.clone(), &[], &overrides), before);
    }

    #[test]
    fn matching_requires_same_rule() {
        let exclusions = [ExclusionEntry::new(TaskId::new(124), date("2022-01-05"))];
        let before = daily_123();
        assert_eq!(reconcile(before.clone(), &exclusions, &[]), before);
    }

    #[test]
    fn cleared_fields_are_copied_as_cleared() {
        let overrides = [OverrideEntry::new(TaskId::new(123), date("2022-01-09"))
            .description(None)
            .start_time(None)];

        let after = reconcile(daily_123(), &[], &overrides);
        let edited = after.iter().find(|o| o.date == date("2022-01-09")).unwrap();

        assert_eq!(edited.changes.description, Patch::Cleared);
        assert_eq!(edited.changes.start_time, Patch::Cleared);
        assert!(edited.changes.end_time.is_unset());
    }

    #[test]
    fn exclusion_wins_over_override() {
        let key = (TaskId::new(123), date("2022-01-05"));
        let exclusions = [ExclusionEntry::new(key.0, key.1)];
        let overrides = [OverrideEntry::new(key.0, key.1).start_time(Some(time("09:00")))];

        let after = reconcile(daily_123(), &exclusions, &overrides);
        assert!(after.iter().all(|o| o.key() != key));
    }

    #[test]
    fn distinct_ids_keep_first_seen_order() {
        let mut occurrences = daily_123();
        let other = RecurrenceRule::new(TaskId::new(7), RecurrenceKind::Weekly, 1, date("2022-01-03"), None);
        occurrences.extend(occurrences_for_rules(
            &[other],
            &Window::new(date("2022-01-01"), date("2022-02-01")),
        ));

        assert_eq!(distinct_rule_ids(&occurrences), vec![TaskId::new(123), TaskId::new(7)]);
        assert!(distinct_rule_ids(&[]).is_empty());
    }
}
