//! Package resolution.
//!
//! The [`PackageResolver`] is the resolution context: it owns the table of
//! package records keyed by normalized import path and hands out shared
//! references into it. Separate resolvers never share state, so tests can
//! build isolated contexts.
//!
//! The table is keyed by import path alone. The first resolution of a path
//! decides whether that record follows test imports; later requests with a
//! different `include_test_imports` get the existing record unchanged.

pub mod errors;
pub mod graph;

pub use errors::ResolveError;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::Package;
use crate::sources::ImportResolver;

/// Resolution context owning every package record.
pub struct PackageResolver {
    importer: Arc<dyn ImportResolver>,
    packages: Mutex<HashMap<String, Arc<Package>>>,
}

impl PackageResolver {
    /// Create a resolver backed by an import service.
    pub fn new(importer: Arc<dyn ImportResolver>) -> Self {
        PackageResolver {
            importer,
            packages: Mutex::new(HashMap::new()),
        }
    }

    /// Get the import service.
    pub fn importer(&self) -> &dyn ImportResolver {
        self.importer.as_ref()
    }

    /// Resolve an import path to its package record.
    ///
    /// On a cache hit `include_test_imports` is ignored.
    pub fn resolve(
        &self,
        import_path: &str,
        src_dir: &Path,
        include_test_imports: bool,
    ) -> Result<Arc<Package>, ResolveError> {
        let import_path = self.importer.normalize(import_path);

        // The table stays locked across the import so a path is imported
        // at most once, even when several threads ask for it together.
        let mut packages = self.lock();
        if let Some(pkg) = packages.get(&import_path) {
            tracing::trace!("package cache hit: {}", import_path);
            return Ok(Arc::clone(pkg));
        }

        let pkg = self.load(&import_path, src_dir, include_test_imports)?;
        packages.insert(import_path, Arc::clone(&pkg));
        Ok(pkg)
    }

    /// Resolve a package record that bypasses the table entirely.
    ///
    /// The record is neither looked up nor stored, so its derived state is
    /// independent of any cached record for the same path.
    pub fn resolve_fresh(
        &self,
        import_path: &str,
        src_dir: &Path,
        include_test_imports: bool,
    ) -> Result<Arc<Package>, ResolveError> {
        let import_path = self.importer.normalize(import_path);
        self.load(&import_path, src_dir, include_test_imports)
    }

    /// Look up an already-resolved package.
    pub fn cached(&self, import_path: &str) -> Option<Arc<Package>> {
        let import_path = self.importer.normalize(import_path);
        self.lock().get(&import_path).cloned()
    }

    /// Number of resolved packages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no package has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn load(
        &self,
        import_path: &str,
        src_dir: &Path,
        include_test_imports: bool,
    ) -> Result<Arc<Package>, ResolveError> {
        tracing::debug!(
            "resolving package {} from {}",
            import_path,
            src_dir.display()
        );

        let meta = self.importer.import(import_path, src_dir)?;
        let pkg = Package::new(meta, include_test_imports);

        if pkg.is_vendored() {
            tracing::debug!("{} is vendored; test imports disabled", pkg.import_path());
        }

        Ok(Arc::new(pkg))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Package>>> {
        self.packages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for PackageResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageResolver")
            .field("packages", &self.len())
            .finish()
    }
}
