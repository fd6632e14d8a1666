//! Configuration file support for zb.
//!
//! zb supports two configuration file locations:
//! - Global: `~/.zb/config.toml` - User-wide defaults
//! - Project: `.zb/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// zb configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target expansion settings
    pub build: BuildConfig,

    /// Lint fingerprint settings
    pub lint: LintConfig,

    /// Test fingerprint settings
    pub test: TestConfig,

    /// Source tree locations
    pub paths: PathsConfig,
}

/// Settings that change how targets are expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Rebuild everything; only generate steps are tracked as dependencies
    pub rebuild_all: bool,

    /// Skip scanning sources for generate directives
    pub no_generate: bool,

    /// Extra build tags considered set when selecting source files
    pub tags: Vec<String>,
}

/// Settings folded into the lint fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Arguments passed to the linter
    pub args: Vec<String>,

    /// Do not lint test sources
    pub no_tests: bool,
}

impl LintConfig {
    /// The effective lint argument list.
    pub fn lint_args(&self) -> &[String] {
        &self.args
    }
}

/// Settings folded into the test fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Race detector enabled
    pub race: bool,

    /// Short mode
    pub short: bool,

    /// Verbose test output
    pub verbose: bool,
}

/// Source tree locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source roots searched for import paths, in order
    pub roots: Vec<PathBuf>,

    /// Root of the standard library sources
    pub std_root: Option<PathBuf>,
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
        if other.build.rebuild_all {
            self.build.rebuild_all = true;
        }
        if other.build.no_generate {
            self.build.no_generate = true;
        }
        if !other.build.tags.is_empty() {
            self.build.tags = other.build.tags;
        }

        if !other.lint.args.is_empty() {
            self.lint.args = other.lint.args;
        }
        if other.lint.no_tests {
            self.lint.no_tests = true;
        }

        self.test.race |= other.test.race;
        self.test.short |= other.test.short;
        self.test.verbose |= other.test.verbose;

        if !other.paths.roots.is_empty() {
            self.paths.roots = other.paths.roots;
        }
        if other.paths.std_root.is_some() {
            self.paths.std_root = other.paths.std_root;
        }
    }
}

/// Get the global zb config directory (~/.zb).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".zb"))
}

/// Get the global config path (~/.zb/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.zb/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".zb").join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.zb/config.toml)
/// 2. Global config (~/.zb/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}
