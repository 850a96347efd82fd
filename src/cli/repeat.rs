//! Recurrence rule commands

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};

use super::output::Output;
use crate::domain::{RecurrenceKind, RecurrenceRule, TaskId, WeekdayMask};
use crate::storage::Project;

/// Interval-based recurrence kinds accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<Cadence> for RecurrenceKind {
    fn from(cadence: Cadence) -> Self {
        match cadence {
            Cadence::Daily => RecurrenceKind::Daily,
            Cadence::Weekly => RecurrenceKind::Weekly,
            Cadence::Monthly => RecurrenceKind::Monthly,
            Cadence::Yearly => RecurrenceKind::Yearly,
        }
    }
}

#[derive(Subcommand)]
pub enum RepeatCommands {
    /// Repeat a task every N days, weeks, months or years
    ///
    /// The task's own date is the first occurrence.
    Set {
        /// Task ID
        id: TaskId,

        cadence: Cadence,

        /// Step between occurrences
        #[arg(long, default_value = "1")]
        every: u32,

        /// Last date an occurrence may fall on
        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// Repeat a task weekly on selected weekdays
    ///
    /// Example:
    ///   planner repeat weekdays 4 mon,wed,fri
    Weekdays {
        /// Task ID
        id: TaskId,

        /// Comma-separated weekdays (mon,tue,...)
        days: WeekdayMask,

        /// Last date an occurrence may fall on
        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// Stop repeating a task
    Clear {
        /// Task ID
        id: TaskId,
    },
}

pub fn run(cmd: RepeatCommands, output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;

    match cmd {
        RepeatCommands::Set {
            id,
            cadence,
            every,
            until,
        } => {
            let rule = store.set_rule(id, cadence.into(), every, until)?;
            report(output, &rule);
        }
        RepeatCommands::Weekdays { id, days, until } => {
            let rule = store.set_rule(id, RecurrenceKind::DayOfWeek, u32::from(days.bits()), until)?;
            report(output, &rule);
        }
        RepeatCommands::Clear { id } => {
            store.clear_rule(id)?;
            if output.is_json() {
                output.data(&serde_json::json!({ "id": id, "repeats": false }));
            } else {
                output.success(&format!("Task {} no longer repeats", id));
            }
        }
    }

    Ok(())
}

fn report(output: &Output, rule: &RecurrenceRule) {
    if output.is_json() {
        output.data(rule);
        return;
    }

    let cadence = match rule.weekdays() {
        Some(days) => format!("every {}", days),
        None => format!("{} every {}", rule.kind, rule.interval),
    };
    let until = rule
        .end_date
        .map(|end| format!(" until {}", end))
        .unwrap_or_default();
    output.success(&format!(
        "Task {} repeats {} from {}{}",
        rule.id, cadence, rule.start_date, until
    ));
}
