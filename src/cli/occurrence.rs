//! Single-occurrence commands: skip one date, or edit one date's details

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use tracing::warn;

use super::output::Output;
use crate::domain::{
    occurrences_for_rules, ExclusionEntry, OverrideEntry, Patch, TaskId, TaskTime, Window,
};
use crate::storage::{Project, Store};

#[derive(Subcommand)]
pub enum OccurrenceCommands {
    /// Delete one occurrence of a repeating task
    Skip {
        /// Task ID
        id: TaskId,

        /// Date of the occurrence
        date: NaiveDate,
    },

    /// Change the time or description of one occurrence
    Edit(EditArgs),
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    id: TaskId,

    /// Date of the occurrence
    date: NaiveDate,

    /// New start time (HH:MM)
    #[arg(long, conflicts_with = "clear_start")]
    start: Option<TaskTime>,

    /// Remove the start time
    #[arg(long)]
    clear_start: bool,

    /// New end time (HH:MM)
    #[arg(long, conflicts_with = "clear_end")]
    end: Option<TaskTime>,

    /// Remove the end time
    #[arg(long)]
    clear_end: bool,

    /// New description
    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,

    /// Remove the description
    #[arg(long)]
    clear_description: bool,
}

fn patch<T>(value: Option<T>, clear: bool) -> Patch<T> {
    match (value, clear) {
        (Some(v), _) => Patch::Value(v),
        (None, true) => Patch::Cleared,
        (None, false) => Patch::Unset,
    }
}

impl EditArgs {
    fn into_entry(self) -> OverrideEntry {
        OverrideEntry::new(self.id, self.date)
            .start_time(patch(self.start, self.clear_start))
            .end_time(patch(self.end, self.clear_end))
            .description(patch(self.description, self.clear_description))
    }
}

pub fn run(cmd: OccurrenceCommands, output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store()?;

    match cmd {
        OccurrenceCommands::Skip { id, date } => {
            warn_if_not_scheduled(&store, id, date)?;
            store.exclude_occurrence(ExclusionEntry::new(id, date))?;

            if output.is_json() {
                output.data(&ExclusionEntry::new(id, date));
            } else {
                output.success(&format!("Skipped task {} on {}", id, date));
            }
        }
        OccurrenceCommands::Edit(args) => {
            let entry = args.into_entry();
            if entry.changes.is_empty() {
                anyhow::bail!("Nothing to change. Pass --start, --end or --description (or a --clear-* flag).");
            }
            warn_if_not_scheduled(&store, entry.rule_id, entry.date)?;
            let stored = store.upsert_override(entry)?;

            if output.is_json() {
                output.data(&stored);
            } else {
                output.success(&format!("Edited task {} on {}", stored.rule_id, stored.date));
            }
        }
    }

    Ok(())
}

/// Entries for dates the rule never produces are stored but have no effect
fn warn_if_not_scheduled(store: &Store, id: TaskId, date: NaiveDate) -> Result<()> {
    let Some(rule) = store.rule(id)? else {
        return Ok(());
    };
    let Some(next_day) = date.succ_opt() else {
        return Ok(());
    };

    let scheduled = occurrences_for_rules(&[rule], &Window::new(date, next_day))
        .iter()
        .any(|occurrence| occurrence.date == date);
    if !scheduled {
        warn!(%id, %date, "task has no occurrence on this date");
    }

    Ok(())
}
