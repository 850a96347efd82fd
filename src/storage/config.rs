//! Configuration handling for the planner
//!
//! Configuration is stored in `.planner/config.toml` (project) and
//! `~/.config/planner/config.toml` (global). Missing files fall back to
//! defaults; a file that exists but does not parse is an error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-project directory
pub const PROJECT_DIR: &str = ".planner";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Window shown by `planner agenda` when no range is given
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgendaSpan {
    #[default]
    Month,
    Year,
}

impl AgendaSpan {
    pub fn as_str(&self) -> &str {
        match self {
            AgendaSpan::Month => "month",
            AgendaSpan::Year => "year",
        }
    }
}

/// Agenda settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgendaConfig {
    pub default_span: AgendaSpan,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Database file name inside `.planner/`
    pub database: String,

    pub agenda: AgendaConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            database: "planner.db".to_string(),
            agenda: AgendaConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Rejects values that would escape the project directory
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.database.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("database name is empty".to_string()));
        }
        if name.contains('/') || name.contains('\\') || name == ".." {
            return Err(ConfigError::Invalid(format!(
                "database must be a file name, got '{}'",
                name
            )));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Log filter used when `--verbose` and `RUST_LOG` are absent
    pub log_level: Option<String>,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Configuration of an opened project
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let project = Self::load_project_config(project_root)?;
        Ok(Self { project })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "planner", "planner").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;
        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for a `.planner/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Walks up from `start` looking for a `.planner/` directory
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
