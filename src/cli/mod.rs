//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Task | Single tasks | `task add`, `task show`, `task delete` |
//! | Repeat | Recurrence rules | `repeat set`, `repeat weekdays`, `repeat clear` |
//! | Occurrence | One date of a series | `occurrence skip`, `occurrence edit` |
//! | Agenda | Materialized view | `agenda --year 2022 --month 1` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logs on stderr:
//! ```bash
//! planner --verbose agenda
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod agenda;
mod app;
mod occurrence;
mod output;
mod repeat;
mod task;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
