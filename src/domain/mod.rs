//! Domain models for the planner
//!
//! Contains the recurrence engine and task model without any I/O concerns.
//!
//! ## Pipeline
//!
//! ```text
//! RecurrenceRule ─► schedules (weekday expansion)
//!                 ─► occurrences in window (numeric domains)
//!                 ─► reconcile (exclusions, overrides)
//!                 ─► materialize (join with base tasks)
//! ```

mod time;
mod task;
mod rule;
mod weekday;
mod numeric;
mod window;
mod occurrence;
mod reconcile;
mod materialize;

pub use time::{TaskTime, TimeError, MS_PER_DAY};
pub use task::{Category, NewTask, Repetition, Task, TaskError, TaskId};
pub use rule::{ParseError, RecurrenceKind, RecurrenceRule, RuleRow, Schedule};
pub use weekday::{expand_day_of_week, WeekdayMask};
pub use numeric::{from_numeric, step, to_numeric};
pub use window::{first_iteration, last_iteration, occurrences, occurrences_for_rules, Window, WindowError};
pub use occurrence::{ExclusionEntry, OccurrenceChanges, OccurrenceSummary, OverrideEntry, Patch};
pub use reconcile::{distinct_rule_ids, reconcile};
pub use materialize::{materialize_occurrences, MaterializeError, TaskSource};
