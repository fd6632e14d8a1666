//! High-level operations.

pub mod expand;

pub use expand::{expand, ExpandError};
