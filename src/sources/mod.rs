//! Package sources.
//!
//! Sources locate packages by import path and decide where their outputs
//! go. [`SourceTree`] is the filesystem implementation.

pub mod constraint;
pub mod scan;
pub mod source;
pub mod tree;

pub use constraint::BuildTags;
pub use source::{ImportResolver, PathMapper};
pub use tree::SourceTree;
