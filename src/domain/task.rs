//! Task domain model
//!
//! A task is a single calendar entry. When a recurrence rule exists for a
//! task, the stored row is the anchor of the series and every materialized
//! occurrence is a copy of it with its own date and a [`Repetition`] tag.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rule::RecurrenceKind;
use super::time::TaskTime;

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("Invalid task ID: '{0}'")]
    InvalidId(String),

    #[error("Unrecognized category code {0}")]
    UnknownCategory(i64),

    #[error("Unrecognized category '{0}' (expected 'simple' or 'important')")]
    UnknownCategoryName(String),
}

/// Database identifier of a task; also identifies the task's recurrence rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| TaskError::InvalidId(s.to_string()))
    }
}

/// Category of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Simple,
    Important,
}

impl Category {
    /// Maps a stored category code
    pub fn from_code(code: i64) -> Result<Self, TaskError> {
        match code {
            0 => Ok(Category::Simple),
            1 => Ok(Category::Important),
            other => Err(TaskError::UnknownCategory(other)),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Category::Simple => 0,
            Category::Important => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Simple => "simple",
            Category::Important => "important",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Category::Simple),
            "important" => Ok(Category::Important),
            _ => Err(TaskError::UnknownCategoryName(s.to_string())),
        }
    }
}

/// Repetition metadata attached to a task materialized from a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repetition {
    pub kind: RecurrenceKind,
    /// Step count, or the weekday bitmask for day-of-week rules
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// A calendar task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    pub date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<TaskTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<TaskTime>,

    /// Short title shown in the calendar cell
    #[serde(default)]
    pub basic_info: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: Category,

    /// Present only on tasks produced by recurrence expansion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition: Option<Repetition>,
}

impl Task {
    /// Creates a task with no times, empty description and simple category
    pub fn new(id: TaskId, date: NaiveDate, basic_info: impl Into<String>) -> Self {
        Self {
            id,
            date,
            start_time: None,
            end_time: None,
            basic_info: basic_info.into(),
            description: String::new(),
            category: Category::Simple,
            repetition: None,
        }
    }

    /// Returns true if this task was produced from a recurrence rule
    pub fn is_recurring(&self) -> bool {
        self.repetition.is_some()
    }

    /// Formats the time span for display (`14:00-16:00`, `14:00-`, or empty)
    pub fn time_span(&self) -> String {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => format!("{}-{}", start, end),
            (Some(start), None) => format!("{}-", start),
            (None, Some(end)) => format!("-{}", end),
            (None, None) => String::new(),
        }
    }
}

/// Data for creating a new task; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub date: NaiveDate,
    pub start_time: Option<TaskTime>,
    pub end_time: Option<TaskTime>,
    pub basic_info: String,
    pub description: String,
    pub category: Category,
}

impl NewTask {
    pub fn new(date: NaiveDate, basic_info: impl Into<String>) -> Self {
        Self {
            date,
            start_time: None,
            end_time: None,
            basic_info: basic_info.into(),
            description: String::new(),
            category: Category::Simple,
        }
    }

    pub fn with_times(mut self, start: Option<TaskTime>, end: Option<TaskTime>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Turns this into a stored task with the assigned id
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            basic_info: self.basic_info,
            description: self.description,
            category: self.category,
            repetition: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn category_codes() {
        assert_eq!(Category::from_code(0), Ok(Category::Simple));
        assert_eq!(Category::from_code(1), Ok(Category::Important));
        assert_eq!(Category::from_code(7), Err(TaskError::UnknownCategory(7)));
        assert_eq!(Category::Important.code(), 1);
    }

    #[test]
    fn category_from_name() {
        assert_eq!("Important".parse::<Category>(), Ok(Category::Important));
        assert!("urgent".parse::<Category>().is_err());
    }

    #[test]
    fn task_id_parse() {
        assert_eq!("42".parse::<TaskId>(), Ok(TaskId::new(42)));
        assert!("t-42".parse::<TaskId>().is_err());
    }

    #[test]
    fn time_span_formatting() {
        let mut task = Task::new(TaskId::new(1), date("2022-01-01"), "Gym");
        assert_eq!(task.time_span(), "");

        task.start_time = TaskTime::new(14, 0);
        assert_eq!(task.time_span(), "14:00-");

        task.end_time = TaskTime::new(16, 30);
        assert_eq!(task.time_span(), "14:00-16:30");
    }

    #[test]
    fn serialization_skips_empty_optionals() {
        let task = Task::new(TaskId::new(3), date("2022-01-01"), "Read");
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["date"], "2022-01-01");
        assert_eq!(json["category"], "simple");
        assert!(json.get("start_time").is_none());
        assert!(json.get("repetition").is_none());
    }

    #[test]
    fn new_task_builder() {
        let task = NewTask::new(date("2022-03-04"), "Dentist")
            .with_times(TaskTime::new(9, 0), TaskTime::new(10, 0))
            .with_description("Bring card")
            .with_category(Category::Important)
            .into_task(TaskId::new(9));

        assert_eq!(task.id, TaskId::new(9));
        assert_eq!(task.description, "Bring card");
        assert_eq!(task.category, Category::Important);
        assert!(!task.is_recurring());
    }
}
