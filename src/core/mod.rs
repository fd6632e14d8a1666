//! Core data structures for zb.
//!
//! This module contains the types the engine passes around:
//! - Packages and the metadata an importer produces for them
//! - Dependencies (package artifacts and generate markers)
//! - Targets and target sets

pub mod dependency;
pub mod package;
pub mod target;

pub use dependency::{Dependency, GenerateMarker, PackageArtifact, Revision};
pub use package::{Package, PackageMetadata, SourceFiles};
pub use target::{Target, TargetKind, TargetSet, UnsupportedOperation};
