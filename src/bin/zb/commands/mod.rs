//! Command implementations

pub mod deps;
pub mod hash;
pub mod targets;
