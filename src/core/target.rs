//! Targets - dependencies with provenance, and the sets expansion builds.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::dependency::Dependency;

/// The operation a target set is expanded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Build,
    Install,
    Generate,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Build => "build",
            TargetKind::Install => "install",
            TargetKind::Generate => "generate",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation name no target kind answers to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported operation `{0}` (expected build, install or generate)")]
pub struct UnsupportedOperation(pub String);

impl FromStr for TargetKind {
    type Err = UnsupportedOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(TargetKind::Build),
            "install" => Ok(TargetKind::Install),
            "generate" => Ok(TargetKind::Generate),
            other => Err(UnsupportedOperation(other.to_string())),
        }
    }
}

/// A dependency together with the target that introduced it.
#[derive(Debug)]
pub struct Target {
    dependency: Dependency,
    parent: Option<Arc<Target>>,
}

impl Target {
    pub fn new(dependency: Dependency, parent: Option<Arc<Target>>) -> Self {
        Target { dependency, parent }
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    /// The target whose dependencies included this one; `None` for the root.
    pub fn parent(&self) -> Option<&Arc<Target>> {
        self.parent.as_ref()
    }

    /// Identity of the target.
    pub fn path(&self) -> &Path {
        self.dependency.path()
    }

    /// Walk the provenance chain towards the root, starting with the parent.
    pub fn ancestors(&self) -> impl Iterator<Item = &Target> {
        std::iter::successors(self.parent.as_deref(), |t| t.parent.as_deref())
    }

    /// Paths from the root down to this target.
    pub fn provenance(&self) -> Vec<&Path> {
        let mut chain: Vec<&Path> = self.ancestors().map(Target::path).collect();
        chain.reverse();
        chain.push(self.path());
        chain
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.dependency, f)
    }
}

/// Insertion-ordered set of targets, unique by path.
#[derive(Debug, Default)]
pub struct TargetSet {
    targets: Vec<Arc<Target>>,
    index: HashMap<PathBuf, usize>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target unless one with the same path is present.
    ///
    /// Returns `true` if the target was added.
    pub fn insert(&mut self, target: Arc<Target>) -> bool {
        let path = target.path().to_path_buf();
        if self.index.contains_key(&path) {
            return false;
        }
        self.index.insert(path, self.targets.len());
        self.targets.push(target);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&Arc<Target>> {
        self.index.get(path).map(|&i| &self.targets[i])
    }

    /// Targets in discovery order; the root comes first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Target>> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets with dependencies ahead of the targets that introduced them.
    pub fn build_order(&self) -> impl Iterator<Item = &Arc<Target>> {
        self.targets.iter().rev()
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a Arc<Target>;
    type IntoIter = std::slice::Iter<'a, Arc<Target>>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}
