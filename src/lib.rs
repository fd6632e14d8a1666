//! zb - dependency resolution and incremental build caching
//!
//! This crate provides the core of a repository-oriented build tool:
//! package resolution, transitive dependency graphs, content fingerprints
//! and expansion of build operations into output targets.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities for zb unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides an in-memory import service and package fixtures written to a
/// temporary source root.
#[cfg(test)]
pub mod test_support;

pub use builder::{
    build_fingerprint, lint_fingerprint, test_fingerprint, BuildContext, Fingerprint,
};
pub use crate::core::{
    Dependency, Package, PackageMetadata, Revision, Target, TargetKind, TargetSet,
};
pub use ops::expand;
pub use resolver::{PackageResolver, ResolveError};
pub use sources::{ImportResolver, PathMapper, SourceTree};
