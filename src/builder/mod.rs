//! Incremental build support.
//!
//! This module holds the build context shared by target expansion and the
//! fingerprint engine that decides whether cached results are still valid.

pub mod context;
pub mod fingerprint;

pub use context::BuildContext;
pub use fingerprint::{
    build_fingerprint, lint_fingerprint, test_fingerprint, Fingerprint, FingerprintError,
};
