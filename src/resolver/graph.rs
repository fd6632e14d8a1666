//! Transitive dependency graph of a package.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::core::package::CGO_IMPORT;
use crate::core::Package;
use crate::resolver::{PackageResolver, ResolveError};
use crate::util::Claim;

impl PackageResolver {
    /// All packages `pkg` transitively imports, sorted by import path.
    ///
    /// Only the root package's own test imports are followed (and only if
    /// its record was resolved with test imports enabled); dependencies are
    /// always resolved without them. The outcome is computed once per
    /// package: a failure is cached and returned again on later calls.
    pub fn dependencies(&self, pkg: &Arc<Package>) -> Result<Vec<Arc<Package>>, ResolveError> {
        match pkg.deps.claim() {
            Claim::Ready(result) => result,
            Claim::Reentered | Claim::Poisoned => Err(ResolveError::Unavailable {
                import_path: pkg.import_path().to_string(),
            }),
            Claim::Vacant(slot) => {
                let result = self.collect_dependencies(pkg);
                match &result {
                    Ok(deps) => tracing::debug!(
                        "{} has {} transitive dependencies",
                        pkg.import_path(),
                        deps.len()
                    ),
                    Err(e) => tracing::debug!("dependencies of {} failed: {}", pkg.import_path(), e),
                }
                slot.fill(result.clone());
                result
            }
        }
    }

    /// Check if `pkg` is reachable from one of the packages it imports.
    pub fn in_import_cycle(&self, pkg: &Arc<Package>) -> Result<bool, ResolveError> {
        for dep in self.dependencies(pkg)? {
            let back = self.dependencies(&dep)?;
            if back.iter().any(|p| p.import_path() == pkg.import_path()) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn collect_dependencies(&self, pkg: &Arc<Package>) -> Result<Vec<Arc<Package>>, ResolveError> {
        let mut seen = HashSet::new();
        seen.insert(pkg.import_path().to_string());

        let mut deps = Vec::new();
        let mut queue = VecDeque::from([Arc::clone(pkg)]);

        while let Some(current) = queue.pop_front() {
            for import_path in current.followed_imports() {
                if import_path == CGO_IMPORT {
                    continue;
                }

                let dep = self
                    .resolve(import_path, current.dir(), false)
                    .map_err(|e| ResolveError::import(current.import_path(), import_path, e))?;

                if !seen.insert(dep.import_path().to_string()) {
                    continue;
                }

                queue.push_back(Arc::clone(&dep));
                deps.push(dep);
            }
        }

        deps.sort_by(|a, b| a.import_path().cmp(b.import_path()));
        Ok(deps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::test_support::{MemoryImporter, PackageFixture};

    fn import_paths(deps: &[Arc<Package>]) -> Vec<&str> {
        deps.iter().map(|p| p.import_path()).collect()
    }

    fn diamond() -> Arc<MemoryImporter> {
        let importer = Arc::new(MemoryImporter::new());
        importer.add(
            PackageFixture::new("example.com/a")
                .import("example.com/c")
                .import("example.com/b")
                .metadata(),
        );
        importer.add(PackageFixture::new("example.com/b").import("example.com/d").metadata());
        importer.add(PackageFixture::new("example.com/c").import("example.com/d").metadata());
        importer.add(PackageFixture::new("example.com/d").metadata());
        importer
    }

    #[test]
    fn test_diamond_sorted_and_deduplicated() {
        let resolver = PackageResolver::new(diamond());
        let a = resolver.resolve("example.com/a", Path::new("/"), false).unwrap();

        let deps = resolver.dependencies(&a).unwrap();
        assert_eq!(
            import_paths(&deps),
            ["example.com/b", "example.com/c", "example.com/d"]
        );
    }

    #[test]
    fn test_dependencies_idempotent() {
        let importer = diamond();
        let resolver = PackageResolver::new(importer.clone());
        let a = resolver.resolve("example.com/a", Path::new("/"), false).unwrap();

        let first = resolver.dependencies(&a).unwrap();
        let calls = importer.calls();
        let second = resolver.dependencies(&a).unwrap();

        assert_eq!(import_paths(&first), import_paths(&second));
        assert_eq!(importer.calls(), calls);
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_cgo_pseudo_import_skipped() {
        let importer = Arc::new(MemoryImporter::new());
        importer.add(
            PackageFixture::new("example.com/a")
                .import("C")
                .import("example.com/b")
                .metadata(),
        );
        importer.add(PackageFixture::new("example.com/b").metadata());
        let resolver = PackageResolver::new(importer);

        let a = resolver.resolve("example.com/a", Path::new("/"), false).unwrap();
        let deps = resolver.dependencies(&a).unwrap();
        assert_eq!(import_paths(&deps), ["example.com/b"]);
    }

    #[test]
    fn test_only_root_follows_test_imports() {
        let importer = Arc::new(MemoryImporter::new());
        importer.add(
            PackageFixture::new("example.com/a")
                .import("example.com/b")
                .test_import("example.com/testutil")
                .xtest_import("example.com/a")
                .metadata(),
        );
        importer.add(
            PackageFixture::new("example.com/b")
                .test_import("example.com/btest")
                .metadata(),
        );
        importer.add(PackageFixture::new("example.com/testutil").metadata());
        importer.add(PackageFixture::new("example.com/btest").metadata());
        let resolver = PackageResolver::new(importer);

        let a = resolver.resolve("example.com/a", Path::new("/"), true).unwrap();
        let deps = resolver.dependencies(&a).unwrap();

        // The self-import from the external test is not a dependency.
        assert_eq!(import_paths(&deps), ["example.com/b", "example.com/testutil"]);
    }

    #[test]
    fn test_vendored_root_skips_test_imports() {
        let importer = Arc::new(MemoryImporter::new());
        importer.add(
            PackageFixture::new("example.com/app/vendor/example.com/lib")
                .import("example.com/b")
                .test_import("example.com/testutil")
                .metadata(),
        );
        importer.add(PackageFixture::new("example.com/b").metadata());
        importer.add(PackageFixture::new("example.com/testutil").metadata());
        let resolver = PackageResolver::new(importer);

        let lib = resolver
            .resolve("example.com/app/vendor/example.com/lib", Path::new("/"), true)
            .unwrap();
        let deps = resolver.dependencies(&lib).unwrap();
        assert_eq!(import_paths(&deps), ["example.com/b"]);
    }

    #[test]
    fn test_failure_is_cached() {
        let importer = Arc::new(MemoryImporter::new());
        importer.add(
            PackageFixture::new("example.com/a")
                .import("example.com/missing")
                .metadata(),
        );
        let resolver = PackageResolver::new(importer.clone());

        let a = resolver.resolve("example.com/a", Path::new("/"), false).unwrap();
        let first = resolver.dependencies(&a).unwrap_err();
        let calls = importer.calls();
        let second = resolver.dependencies(&a).unwrap_err();

        assert_eq!(first, second);
        assert_eq!(importer.calls(), calls);
        assert!(matches!(first.root_cause(), ResolveError::NotFound { .. }));
        assert_eq!(first.import_chain(), [("example.com/a", "example.com/missing")]);
    }

    #[test]
    fn test_import_resolved_from_importer_dir() {
        let importer = Arc::new(MemoryImporter::new());
        importer.add(PackageFixture::new("example.com/a").import("example.com/b").metadata());
        importer.add(PackageFixture::new("example.com/b").metadata());
        let resolver = PackageResolver::new(importer.clone());

        let a = resolver.resolve("example.com/a", Path::new("/"), false).unwrap();
        resolver.dependencies(&a).unwrap();

        assert_eq!(
            importer.last_src_dir("example.com/b"),
            Some(a.dir().to_path_buf())
        );
    }

    #[test]
    fn test_in_import_cycle() {
        let importer = diamond();
        importer.add(PackageFixture::new("example.com/x").import("example.com/y").metadata());
        importer.add(
            PackageFixture::new("example.com/y")
                .import("example.com/z")
                .metadata(),
        );
        importer.add(PackageFixture::new("example.com/z").import("example.com/x").metadata());
        let resolver = PackageResolver::new(importer);

        let x = resolver.resolve("example.com/x", Path::new("/"), false).unwrap();
        let a = resolver.resolve("example.com/a", Path::new("/"), false).unwrap();

        assert!(resolver.in_import_cycle(&x).unwrap());
        assert!(!resolver.in_import_cycle(&a).unwrap());
        assert_eq!(
            import_paths(&resolver.dependencies(&x).unwrap()),
            ["example.com/y", "example.com/z"]
        );
    }
}
