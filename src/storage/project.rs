//! Project management
//!
//! Handles project initialization and provides access to the store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::PROJECT_DIR;
use super::{Config, Store};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a planner project. Run 'planner init' first.")]
    NotInProject,
}

/// A planner project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(PROJECT_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let planner_dir = root.join(PROJECT_DIR);

        fs::create_dir_all(&planner_dir).with_context(|| {
            format!(
                "Failed to create {} directory: {}",
                PROJECT_DIR,
                planner_dir.display()
            )
        })?;

        let config_path = planner_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# Planner configuration

# Database file inside .planner/
database = "planner.db"

[agenda]
# Window shown by 'planner agenda' without a range: "month" or "year"
default_span = "month"
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = planner_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# SQLite database and its write-ahead log
*.db
*.db-wal
*.db-shm
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let project = Self::open(root)?;
        project.store()?;

        Ok(project)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .planner directory path
    pub fn planner_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the database path
    pub fn db_path(&self) -> PathBuf {
        self.planner_dir().join(&self.config.project.database)
    }

    /// Opens the task store for this project
    pub fn store(&self) -> Result<Store> {
        Store::open(&self.db_path())
    }
}
