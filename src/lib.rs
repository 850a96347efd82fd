//! Planner - a personal planner with repeating tasks
//!
//! Tasks live in a local SQLite database. A task can repeat daily, weekly,
//! monthly, yearly or on chosen weekdays; single occurrences can be skipped
//! or edited. [`domain::materialize_occurrences`] expands everything into
//! the concrete task instances of a date window.

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{RecurrenceKind, RecurrenceRule, Task, TaskId, Window};
