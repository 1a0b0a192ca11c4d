//! Configuration file support for stackwalk.
//!
//! Two configuration file locations are read:
//! - Global: `~/.stackwalk/config.toml` - User-wide defaults
//! - Project: `.stackwalk/config.toml` - Overrides for the current directory
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::manifest::MANIFEST_NAME;
use crate::resolver::{ClosureMode, ClosureOptions};

/// stackwalk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fetch settings
    pub fetch: FetchConfig,

    /// Closure settings
    pub closure: ClosureConfig,
}

/// Fetch-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Workspace directory for working copies (None = temporary per run)
    pub workspace: Option<PathBuf>,

    /// Manifest file name inside each checkout
    pub manifest: Option<String>,

    /// Shallow checkouts (default: true)
    pub shallow: Option<bool>,

    /// Don't contact remotes for working copies that already exist
    #[serde(default)]
    pub offline: bool,

    /// Number of parallel fetches (None = 1)
    pub jobs: Option<usize>,
}

/// Closure-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureConfig {
    /// Closure mode (build-closure, direct)
    pub mode: Option<ClosureMode>,

    /// Remove packages from their own dependency sets
    #[serde(default)]
    pub prune_self: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Fetch settings
        if other.fetch.workspace.is_some() {
            self.fetch.workspace = other.fetch.workspace;
        }
        if other.fetch.manifest.is_some() {
            self.fetch.manifest = other.fetch.manifest;
        }
        if other.fetch.shallow.is_some() {
            self.fetch.shallow = other.fetch.shallow;
        }
        if other.fetch.offline {
            self.fetch.offline = true;
        }
        if other.fetch.jobs.is_some() {
            self.fetch.jobs = other.fetch.jobs;
        }

        // Closure settings
        if other.closure.mode.is_some() {
            self.closure.mode = other.closure.mode;
        }
        if other.closure.prune_self {
            self.closure.prune_self = true;
        }
    }

    /// Manifest file name, defaulting to `stack.toml`.
    pub fn manifest_name(&self) -> &str {
        self.fetch.manifest.as_deref().unwrap_or(MANIFEST_NAME)
    }

    pub fn shallow(&self) -> bool {
        self.fetch.shallow.unwrap_or(true)
    }

    /// Parallel fetches, at least 1.
    pub fn jobs(&self) -> usize {
        self.fetch.jobs.unwrap_or(1).max(1)
    }

    pub fn closure_options(&self) -> ClosureOptions {
        ClosureOptions {
            mode: self.closure.mode.unwrap_or_default(),
            prune_self: self.closure.prune_self,
        }
    }
}

/// Get the global stackwalk config directory (~/.stackwalk).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".stackwalk"))
}

/// Get the global config path (~/.stackwalk/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.stackwalk/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".stackwalk").join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.stackwalk/config.toml)
/// 2. Global config (~/.stackwalk/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Load the configuration that applies in `cwd`.
pub fn load_config_for(cwd: &Path) -> Config {
    let project_path = project_config_path(cwd);
    match global_config_path() {
        Some(global_path) => load_config(&global_path, &project_path),
        None => load_config(Path::new(""), &project_path),
    }
}
