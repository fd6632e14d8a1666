//! Global context for zb operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::builder::BuildContext;
use crate::resolver::PackageResolver;
use crate::sources::{BuildTags, PathMapper, SourceTree};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Directory marking a project root.
pub const PROJECT_DIR_NAME: &str = ".zb";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Directory holding `.zb/`, or the cwd if there is none
    project_root: PathBuf,

    /// Merged global and project configuration
    config: Config,

    /// Whether diagnostics use terminal colors
    color: bool,
}

impl GlobalContext {
    /// Create a context for the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context for a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let project_root = find_project_root(&cwd).unwrap_or_else(|| cwd.clone());
        let config = load_config(
            global_config_path().as_deref(),
            &project_config_path(&project_root),
        );

        GlobalContext {
            cwd,
            project_root,
            config,
            color: true,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Enable or disable colored diagnostics.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Check if diagnostics should be colored.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Source roots to search; relative entries are taken from the project
    /// root. Falls back to the working directory.
    pub fn source_roots(&self) -> Vec<PathBuf> {
        if self.config.paths.roots.is_empty() {
            return vec![self.cwd.clone()];
        }
        self.config
            .paths
            .roots
            .iter()
            .map(|root| self.project_root.join(root))
            .collect()
    }

    /// The filesystem import service for this context.
    pub fn source_tree(&self) -> SourceTree {
        let tags = BuildTags::host().with_tags(self.config.build.tags.iter().cloned());
        let mut tree = SourceTree::new(self.source_roots()).with_build_tags(tags);
        if let Some(std_root) = &self.config.paths.std_root {
            tree = tree.with_std_root(self.project_root.join(std_root));
        }
        if !tree.roots().iter().any(|root| self.cwd.starts_with(root)) {
            return tree;
        }
        let project = tree.dir_to_import_path(&self.cwd);
        tree.with_project_import_path(project)
    }

    /// A fresh build context over [`Self::source_tree`].
    pub fn build_context(&self) -> BuildContext {
        let tree = Arc::new(self.source_tree());
        BuildContext::new(PackageResolver::new(tree.clone()), tree)
            .with_config(self.config.build.clone())
    }
}

/// Search `start` and its ancestors for a directory holding `.zb/`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_DIR_NAME).is_dir())
        .map(Path::to_path_buf)
}
