//! Agenda command: every task instance in a date window

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;

use super::output::Output;
use crate::domain::{materialize_occurrences, Window};
use crate::storage::{AgendaSpan, Project};

#[derive(Args)]
pub struct AgendaArgs {
    /// First day of the window (inclusive)
    #[arg(long, requires = "to", conflicts_with = "year")]
    from: Option<NaiveDate>,

    /// Day after the window (exclusive)
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Calendar year to show
    #[arg(long)]
    year: Option<i32>,

    /// Month of --year to show (1-12)
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
}

impl AgendaArgs {
    fn window(&self, default_span: AgendaSpan, today: NaiveDate) -> Result<Window> {
        let window = match (self.from, self.to, self.year, self.month) {
            (Some(from), Some(to), _, _) => Window::new(from, to),
            (_, _, Some(year), Some(month)) => Window::month(year, month)?,
            (_, _, Some(year), None) => Window::year(year)?,
            _ => match default_span {
                AgendaSpan::Month => Window::month_of(today)?,
                AgendaSpan::Year => Window::year(today.year())?,
            },
        };
        Ok(window)
    }
}

pub fn run(args: AgendaArgs, output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;

    let today = Local::now().date_naive();
    let window = args.window(project.config().project.agenda.default_span, today)?;
    tracing::debug!(start = %window.start, end = %window.end, "agenda window");

    let tasks = materialize_occurrences(&store, &window)
        .with_context(|| format!("Failed to build agenda for {} to {}", window.start, window.end))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "start": window.start,
            "end": window.end,
            "tasks": tasks,
        }));
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks between {} and {}", window.start, window.end);
        return Ok(());
    }

    for task in &tasks {
        output.task_row(task);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn args(from: Option<&str>, to: Option<&str>, year: Option<i32>, month: Option<u32>) -> AgendaArgs {
        AgendaArgs {
            from: from.map(date),
            to: to.map(date),
            year,
            month,
        }
    }

    #[test]
    fn explicit_range() {
        let w = args(Some("2022-01-03"), Some("2022-01-10"), None, None)
            .window(AgendaSpan::Month, date("2030-01-01"))
            .unwrap();
        assert_eq!(w, Window::new(date("2022-01-03"), date("2022-01-10")));
    }

    #[test]
    fn year_and_month() {
        let today = date("2030-01-01");
        assert_eq!(
            args(None, None, Some(2022), Some(2)).window(AgendaSpan::Month, today).unwrap(),
            Window::month(2022, 2).unwrap()
        );
        assert_eq!(
            args(None, None, Some(2022), None).window(AgendaSpan::Month, today).unwrap(),
            Window::year(2022).unwrap()
        );
    }

    #[test]
    fn default_span_follows_config() {
        let today = date("2022-03-15");
        assert_eq!(
            args(None, None, None, None).window(AgendaSpan::Month, today).unwrap(),
            Window::month(2022, 3).unwrap()
        );
        assert_eq!(
            args(None, None, None, None).window(AgendaSpan::Year, today).unwrap(),
            Window::year(2022).unwrap()
        );
    }
}
