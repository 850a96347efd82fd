//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use super::agenda::{self, AgendaArgs};
use super::occurrence::{self, OccurrenceCommands};
use super::output::{Output, OutputFormat};
use super::repeat::{self, RepeatCommands};
use super::task::{self, TaskCommands};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "planner")]
#[command(author, version, about = "Personal planner with repeating tasks")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new planner project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommands),

    /// Make tasks repeat
    #[command(subcommand)]
    Repeat(RepeatCommands),

    /// Skip or edit single occurrences of a repeating task
    #[command(subcommand)]
    Occurrence(OccurrenceCommands),

    /// List every task instance in a date window
    Agenda(AgendaArgs),
}

/// Installs the stderr log subscriber.
///
/// `--verbose` wins, then `RUST_LOG`, then the configured level.
fn init_logging(verbose: bool, configured: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(configured.unwrap_or("warn")))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let global = Config::load_global()?;

    init_logging(cli.verbose, global.log_level.as_deref());
    let output = Output::new(cli.format.unwrap_or_else(|| global.default_format.into()));

    tracing::debug!("planner starting");

    match cli.command {
        Commands::Init { path } => {
            tracing::debug!(%path, "initializing project");
            let project = Project::init(&path)?;
            tracing::debug!(db = %project.db_path().display(), "database ready");
            output.success(&format!("Initialized planner project at {}", project.root().display()));
        }

        Commands::Task(cmd) => task::run(cmd, &output)?,
        Commands::Repeat(cmd) => repeat::run(cmd, &output)?,
        Commands::Occurrence(cmd) => occurrence::run(cmd, &output)?,
        Commands::Agenda(args) => agenda::run(args, &output)?,
    }

    tracing::debug!("command completed");
    Ok(())
}
