//! Task materialization
//!
//! Turns the rules and stored tasks of a window into the final list of task
//! instances: generated occurrences are reconciled against exclusions and
//! overrides, joined with their base task rows, and merged with the plain
//! (non-recurring) tasks of the window.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use super::occurrence::{ExclusionEntry, OccurrenceSummary, OverrideEntry};
use super::reconcile::{distinct_rule_ids, reconcile};
use super::rule::RecurrenceRule;
use super::task::{Repetition, Task, TaskId};
use super::window::{occurrences_for_rules, Window};

/// Read access to stored tasks, rules and per-occurrence edits.
///
/// Every fetch takes the whole id set at once; implementations are expected
/// to answer each call with a single query.
pub trait TaskSource {
    /// Rules for the given task ids, or every rule when `ids` is `None`
    fn fetch_rules(&self, ids: Option<&[TaskId]>) -> anyhow::Result<Vec<RecurrenceRule>>;

    /// Rules anchored before the window end that have not ended before its start
    fn fetch_active_rules(&self, window: &Window) -> anyhow::Result<Vec<RecurrenceRule>>;

    fn fetch_exclusions(&self, ids: &[TaskId]) -> anyhow::Result<Vec<ExclusionEntry>>;

    fn fetch_overrides(&self, ids: &[TaskId]) -> anyhow::Result<Vec<OverrideEntry>>;

    fn fetch_base_tasks(&self, ids: &[TaskId]) -> anyhow::Result<Vec<Task>>;

    /// Tasks whose own date lies in the window
    fn fetch_tasks_in_range(&self, window: &Window) -> anyhow::Result<Vec<Task>>;
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Failed to fetch {fetch}")]
    Collaborator {
        fetch: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

fn fetch<T>(fetch: &'static str, result: anyhow::Result<T>) -> Result<T, MaterializeError> {
    result.map_err(|source| MaterializeError::Collaborator { fetch, source })
}

/// Builds every task instance that falls in `window`.
///
/// Output is sorted by date, then id. Occurrences whose base task cannot be
/// found are dropped.
pub fn materialize_occurrences(
    source: &impl TaskSource,
    window: &Window,
) -> Result<Vec<Task>, MaterializeError> {
    if window.is_empty() {
        return Ok(Vec::new());
    }

    let in_range = fetch("tasks in range", source.fetch_tasks_in_range(window))?;
    let rules = fetch("rules", source.fetch_active_rules(window))?;

    // Monthly and yearly bounds are only month/year precise
    let occurrences: Vec<OccurrenceSummary> = occurrences_for_rules(&rules, window)
        .into_iter()
        .filter(|occurrence| {
            window.contains(occurrence.date)
                && occurrence.end_date.map_or(true, |end| occurrence.date <= end)
        })
        .collect();
    debug!(
        rules = rules.len(),
        occurrences = occurrences.len(),
        "generated occurrences"
    );

    let rule_ids = distinct_rule_ids(&occurrences);
    let (exclusions, overrides) = if rule_ids.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        (
            fetch("exclusions", source.fetch_exclusions(&rule_ids))?,
            fetch("overrides", source.fetch_overrides(&rule_ids))?,
        )
    };
    let occurrences = reconcile(occurrences, &exclusions, &overrides);
    debug!(
        exclusions = exclusions.len(),
        overrides = overrides.len(),
        remaining = occurrences.len(),
        "reconciled occurrences"
    );

    let recurring: HashSet<TaskId> = rules.iter().map(|rule| rule.id).collect();
    let mut bases: HashMap<TaskId, Task> = HashMap::new();
    let mut tasks = Vec::new();
    for task in in_range {
        if recurring.contains(&task.id) {
            bases.insert(task.id, task);
        } else {
            tasks.push(task);
        }
    }

    let missing: Vec<TaskId> = distinct_rule_ids(&occurrences)
        .into_iter()
        .filter(|id| !bases.contains_key(id))
        .collect();
    if !missing.is_empty() {
        debug!(count = missing.len(), "fetching base tasks outside window");
        for task in fetch("base tasks", source.fetch_base_tasks(&missing))? {
            bases.insert(task.id, task);
        }
    }

    for occurrence in occurrences {
        match bases.get(&occurrence.rule_id) {
            Some(base) => tasks.push(instantiate(base, occurrence)),
            None => debug!(id = %occurrence.rule_id, date = %occurrence.date, "dropping occurrence without base task"),
        }
    }

    tasks.sort_by(|a, b| (a.date, a.id).cmp(&(b.date, b.id)));
    Ok(tasks)
}

fn instantiate(base: &Task, occurrence: OccurrenceSummary) -> Task {
    let mut task = base.clone();
    task.date = occurrence.date;
    occurrence.changes.apply_to(&mut task);
    task.repetition = Some(Repetition {
        kind: occurrence.kind,
        interval: occurrence.interval,
        end_date: occurrence.end_date,
    });
    task
}
