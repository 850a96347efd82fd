//! # Storage Layer
//!
//! Persistence layer for the planner.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks, rules, exclusions, overrides | SQLite | `.planner/planner.db` |
//! | Config | TOML | `.planner/config.toml` |
//!
//! ## Project Structure
//!
//! ```text
//! .planner/
//! ├── planner.db            # SQLite database (WAL mode)
//! ├── config.toml           # Project configuration
//! └── .gitignore            # Ignores the database files
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a planner project
//! - [`Store`] - SQLite storage; implements [`crate::domain::TaskSource`]
//! - [`Config`] - Project and global configuration

mod config;
mod project;
mod store;

pub use config::{
    AgendaConfig, AgendaSpan, Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig,
    PROJECT_DIR,
};
pub use project::{Project, ProjectError};
pub use store::{Store, StoreError};
