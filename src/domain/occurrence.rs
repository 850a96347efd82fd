//! Occurrences and the per-occurrence override tables
//!
//! An [`OccurrenceSummary`] is one generated date of a rule. Exclusions
//! delete single occurrences; overrides edit their times or description.
//! Both are matched on the exact `(rule id, date)` pair.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::rule::RecurrenceKind;
use super::task::{Task, TaskId};
use super::time::TaskTime;

/// A field edit that distinguishes "not edited" from "edited to nothing"
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// The override does not touch this field
    #[default]
    Unset,
    /// The override explicitly removes the value
    Cleared,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Unset => Patch::Unset,
            Patch::Cleared => Patch::Cleared,
            Patch::Value(v) => Patch::Value(v),
        }
    }

    /// Applies the edit to an optional value
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Unset => current,
            Patch::Cleared => None,
            Patch::Value(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// `None` means cleared; use [`Patch::Unset`] for "not edited"
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Cleared,
        }
    }
}

// Unset fields are skipped by the containing struct, so only Cleared and
// Value reach the serializer.
impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Unset | Patch::Cleared => serializer.serialize_none(),
            Patch::Value(v) => serializer.serialize_some(v),
        }
    }
}

// Called only when the key is present; a missing key falls back to
// `#[serde(default)]`, which is Unset.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

/// Edits carried by an override and copied onto its occurrence
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OccurrenceChanges {
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub start_time: Patch<TaskTime>,

    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub end_time: Patch<TaskTime>,

    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub description: Patch<String>,
}

impl OccurrenceChanges {
    pub fn is_empty(&self) -> bool {
        self.start_time.is_unset() && self.end_time.is_unset() && self.description.is_unset()
    }

    /// Combines two edits of the same occurrence; fields set in `newer` win
    pub fn merged_with(self, newer: OccurrenceChanges) -> Self {
        fn pick<T>(older: Patch<T>, newer: Patch<T>) -> Patch<T> {
            if newer.is_unset() {
                older
            } else {
                newer
            }
        }

        Self {
            start_time: pick(self.start_time, newer.start_time),
            end_time: pick(self.end_time, newer.end_time),
            description: pick(self.description, newer.description),
        }
    }

    /// Layers the edits onto a task copied from the series' base row
    pub fn apply_to(&self, task: &mut Task) {
        task.start_time = self.start_time.clone().apply(task.start_time);
        task.end_time = self.end_time.clone().apply(task.end_time);
        task.description = match &self.description {
            Patch::Unset => std::mem::take(&mut task.description),
            Patch::Cleared => String::new(),
            Patch::Value(d) => d.clone(),
        };
    }
}

/// One concrete occurrence of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceSummary {
    pub rule_id: TaskId,
    pub date: NaiveDate,
    pub kind: RecurrenceKind,
    /// Interval as stored on the rule (the weekday mask for day-of-week rules)
    pub interval: u32,
    pub end_date: Option<NaiveDate>,
    /// Filled in by the reconciler when an override matches
    pub changes: OccurrenceChanges,
}

impl OccurrenceSummary {
    pub fn key(&self) -> (TaskId, NaiveDate) {
        (self.rule_id, self.date)
    }
}

/// A deleted single occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExclusionEntry {
    pub rule_id: TaskId,
    pub date: NaiveDate,
}

impl ExclusionEntry {
    pub fn new(rule_id: TaskId, date: NaiveDate) -> Self {
        Self { rule_id, date }
    }
}

/// An edit to a single occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub rule_id: TaskId,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub changes: OccurrenceChanges,
}

impl OverrideEntry {
    pub fn new(rule_id: TaskId, date: NaiveDate) -> Self {
        Self {
            rule_id,
            date,
            changes: OccurrenceChanges::default(),
        }
    }

    pub fn start_time(mut self, patch: impl Into<Patch<TaskTime>>) -> Self {
        self.changes.start_time = patch.into();
        self
    }

    pub fn end_time(mut self, patch: impl Into<Patch<TaskTime>>) -> Self {
        self.changes.end_time = patch.into();
        self
    }

    pub fn description(mut self, patch: impl Into<Patch<String>>) -> Self {
        self.changes.description = patch.into();
        self
    }
}
