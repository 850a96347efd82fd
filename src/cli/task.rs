//! Task CLI commands

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{Category, NewTask, TaskId, TaskTime};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    ///
    /// Examples:
    ///   planner task add 2022-01-05 "Dentist" --start 09:00 --end 09:45
    ///   planner task add 2022-01-01 "Swim" --important
    Add {
        /// Date of the task (YYYY-MM-DD)
        date: NaiveDate,

        /// Short title
        basic_info: String,

        /// Longer description
        #[arg(long, short, default_value = "")]
        description: String,

        /// Start time (HH:MM)
        #[arg(long)]
        start: Option<TaskTime>,

        /// End time (HH:MM)
        #[arg(long)]
        end: Option<TaskTime>,

        /// Mark the task as important
        #[arg(long)]
        important: bool,
    },

    /// Show task details, including its recurrence rule
    Show {
        /// Task ID
        id: TaskId,
    },

    /// Delete a task and everything attached to it
    Delete {
        /// Task ID
        id: TaskId,
    },
}

pub fn run(cmd: TaskCommands, output: &Output) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            date,
            basic_info,
            description,
            start,
            end,
            important,
        } => {
            let category = if important {
                Category::Important
            } else {
                Category::Simple
            };
            let task = NewTask::new(date, basic_info)
                .with_times(start, end)
                .with_description(description)
                .with_category(category);
            add_task(output, task)
        }
        TaskCommands::Show { id } => show_task(output, id),
        TaskCommands::Delete { id } => delete_task(output, id),
    }
}

fn add_task(output: &Output, task: NewTask) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;

    let task = store.create_task(task)?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Created task: {} - {}", task.id, task.basic_info));
    }

    Ok(())
}

fn show_task(output: &Output, id: TaskId) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;

    let task = store
        .task(id)?
        .with_context(|| format!("Task not found: {}", id))?;
    let rule = store.rule(id)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "rule": rule,
        }));
        return Ok(());
    }

    println!("{}: {}", task.id, task.basic_info);
    println!("Date: {}", task.date);
    let span = task.time_span();
    if !span.is_empty() {
        println!("Time: {}", span);
    }
    println!("Category: {}", task.category);
    if !task.description.is_empty() {
        println!();
        println!("{}", task.description);
    }

    if let Some(rule) = rule {
        println!();
        let cadence = match rule.weekdays() {
            Some(days) => format!("every {}", days),
            None => format!("{} (every {})", rule.kind, rule.interval),
        };
        match rule.end_date {
            Some(end) => println!("Repeats: {} until {}", cadence, end),
            None => println!("Repeats: {}", cadence),
        }
    }

    Ok(())
}

fn delete_task(output: &Output, id: TaskId) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;

    store.delete_task(id)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "id": id, "deleted": true }));
    } else {
        output.success(&format!("Deleted task: {}", id));
    }

    Ok(())
}
