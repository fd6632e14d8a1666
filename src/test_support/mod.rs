//! Test utilities and mocks for zb unit tests.
//!
//! [`MemoryImporter`] is an in-memory import service that counts how often
//! it is asked to import, which is how the memoization tests observe that
//! work happens only once. [`PackageFixture`] and [`Sandbox`] build packages
//! whose sources actually exist on disk, for fingerprint and expansion tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use zb::test_support::{PackageFixture, Sandbox};
//!
//! #[test]
//! fn test_example() {
//!     let sandbox = Sandbox::new();
//!     sandbox.add(PackageFixture::new("example.com/a").source("a.go", "package a\n"));
//!
//!     let ctx = sandbox.context();
//!     let a = sandbox.resolve(&ctx, "example.com/a");
//!     // ...
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::core::PackageMetadata;
use crate::resolver::ResolveError;
use crate::sources::ImportResolver;

pub use fixtures::*;

/// In-memory import service.
#[derive(Debug, Default)]
pub struct MemoryImporter {
    packages: Mutex<HashMap<String, PackageMetadata>>,
    src_dirs: Mutex<HashMap<String, PathBuf>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: AtomicUsize,
}

impl MemoryImporter {
    /// Create an empty importer.
    pub fn new() -> Self {
        MemoryImporter::default()
    }

    /// Register a package under its import path, replacing any earlier one.
    pub fn add(&self, meta: PackageMetadata) {
        self.packages
            .lock()
            .unwrap()
            .insert(meta.import_path.clone(), meta);
    }

    /// Make every import of `import_path` sleep first, to widen races.
    pub fn delay(&self, import_path: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(import_path.to_string(), delay);
    }

    /// Number of `import` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The source directory of the most recent import of `import_path`.
    pub fn last_src_dir(&self, import_path: &str) -> Option<PathBuf> {
        self.src_dirs.lock().unwrap().get(import_path).cloned()
    }
}

impl ImportResolver for MemoryImporter {
    fn import(&self, import_path: &str, src_dir: &Path) -> Result<PackageMetadata, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.src_dirs
            .lock()
            .unwrap()
            .insert(import_path.to_string(), src_dir.to_path_buf());

        let delay = self.delays.lock().unwrap().get(import_path).copied();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        self.packages
            .lock()
            .unwrap()
            .get(import_path)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound {
                import_path: import_path.to_string(),
                src_dir: src_dir.to_path_buf(),
                searched: Vec::new(),
            })
    }

    fn normalize(&self, import_path: &str) -> String {
        import_path.trim_end_matches('/').to_string()
    }
}
