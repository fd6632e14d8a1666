//! Package - one compilation unit and its memoized derived state.
//!
//! A [`Package`] wraps the [`PackageMetadata`] returned by an import
//! resolver. It is created once per normalized import path by the
//! [`PackageResolver`](crate::resolver::PackageResolver) and afterwards only
//! its derived caches (dependency list and the three fingerprints) are
//! populated, each exactly once.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builder::fingerprint::Fingerprint;
use crate::resolver::ResolveError;
use crate::util::Memo;

/// The pseudo-import used by cgo. It never names a real package.
pub const CGO_IMPORT: &str = "C";

/// Package clause name of command (executable) packages.
pub const COMMAND_NAME: &str = "main";

/// Source files of a package, grouped by category.
///
/// All names are relative to the package directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFiles {
    /// Primary sources, excluding tests and cgo sources
    pub sources: Vec<String>,
    /// Primary sources that import "C"
    pub cgo_sources: Vec<String>,
    pub c_sources: Vec<String>,
    pub cxx_sources: Vec<String>,
    pub objc_sources: Vec<String>,
    pub headers: Vec<String>,
    pub asm_sources: Vec<String>,
    pub swig_sources: Vec<String>,
    pub swig_cxx_sources: Vec<String>,
    /// Prebuilt object files linked into the package
    pub object_files: Vec<String>,
    /// In-package test sources
    pub test_sources: Vec<String>,
    /// External (`_test` package) test sources
    pub xtest_sources: Vec<String>,
}

impl SourceFiles {
    /// Files that make up the compiled package, in fingerprint order.
    pub fn build_inputs(&self) -> Vec<&str> {
        [
            &self.sources,
            &self.cgo_sources,
            &self.c_sources,
            &self.cxx_sources,
            &self.objc_sources,
            &self.headers,
            &self.asm_sources,
            &self.swig_sources,
            &self.swig_cxx_sources,
            &self.object_files,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect()
    }

    /// Test and external-test sources, in fingerprint order.
    pub fn test_inputs(&self) -> Vec<&str> {
        self.test_sources
            .iter()
            .chain(&self.xtest_sources)
            .map(String::as_str)
            .collect()
    }

    /// Files checked by the linter.
    pub fn lint_inputs(&self, include_tests: bool) -> Vec<&str> {
        let mut files = self.build_inputs();
        if include_tests {
            files.extend(self.test_inputs());
        }
        files
    }

    /// Files that may carry generate directives.
    pub fn generate_candidates(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .chain(&self.cgo_sources)
            .map(String::as_str)
    }

    /// Check whether the package has no files at all.
    pub fn is_empty(&self) -> bool {
        self.build_inputs().is_empty() && self.test_inputs().is_empty()
    }
}

/// Everything an import resolver knows about a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Resolved import path (may include a vendor prefix)
    pub import_path: String,

    /// Package clause name; `main` for commands
    pub name: String,

    /// Directory holding the sources
    pub dir: PathBuf,

    /// Source root the package was found under
    pub root: Option<PathBuf>,

    /// Whether this package belongs to the standard library
    pub standard: bool,

    /// Categorized source files
    pub files: SourceFiles,

    /// Imports of the non-test sources
    pub imports: Vec<String>,

    /// Imports of the in-package test sources
    pub test_imports: Vec<String>,

    /// Imports of the external test sources
    pub xtest_imports: Vec<String>,
}

impl PackageMetadata {
    /// Check if this package builds an executable.
    pub fn is_command(&self) -> bool {
        self.name == COMMAND_NAME
    }

    /// Last element of the import path.
    pub fn base_name(&self) -> &str {
        self.import_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.import_path)
    }
}

/// Check if an import path goes through a `vendor` directory.
pub fn is_vendored_path(import_path: &str) -> bool {
    import_path.starts_with("vendor/") || import_path.contains("/vendor/")
}

/// A resolved package with its memoized derived state.
pub struct Package {
    meta: PackageMetadata,

    vendored: bool,

    include_test_imports: bool,

    pub(crate) deps: Memo<Result<Vec<Arc<Package>>, ResolveError>>,
    pub(crate) build_fingerprint: Memo<Fingerprint>,
    pub(crate) test_fingerprint: Memo<Fingerprint>,
    pub(crate) lint_fingerprint: Memo<Fingerprint>,
}

impl Package {
    /// Create a package record.
    ///
    /// Vendored packages never follow test imports, whatever the caller asks.
    pub fn new(meta: PackageMetadata, include_test_imports: bool) -> Self {
        let vendored = is_vendored_path(&meta.import_path);

        Package {
            meta,
            vendored,
            include_test_imports: include_test_imports && !vendored,
            deps: Memo::new(),
            build_fingerprint: Memo::new(),
            test_fingerprint: Memo::new(),
            lint_fingerprint: Memo::new(),
        }
    }

    /// Get the resolver metadata.
    pub fn metadata(&self) -> &PackageMetadata {
        &self.meta
    }

    /// Get the import path.
    pub fn import_path(&self) -> &str {
        &self.meta.import_path
    }

    /// Get the package clause name.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Get the package directory.
    pub fn dir(&self) -> &Path {
        &self.meta.dir
    }

    /// Get the categorized source files.
    pub fn files(&self) -> &SourceFiles {
        &self.meta.files
    }

    /// Imports of the non-test sources.
    pub fn imports(&self) -> &[String] {
        &self.meta.imports
    }

    /// Imports of the in-package tests.
    pub fn test_imports(&self) -> &[String] {
        &self.meta.test_imports
    }

    /// Imports of the external tests.
    pub fn xtest_imports(&self) -> &[String] {
        &self.meta.xtest_imports
    }

    /// Check if the package is a command.
    pub fn is_command(&self) -> bool {
        self.meta.is_command()
    }

    /// Check if the package is part of the standard library.
    pub fn is_standard(&self) -> bool {
        self.meta.standard
    }

    /// Check if the package was reached through a vendor directory.
    pub fn is_vendored(&self) -> bool {
        self.vendored
    }

    /// Whether the dependency closure follows test imports.
    pub fn includes_test_imports(&self) -> bool {
        self.include_test_imports
    }

    /// Imports followed when computing the dependency closure.
    pub fn followed_imports(&self) -> impl Iterator<Item = &str> {
        let tests: &[String] = if self.include_test_imports {
            &self.meta.test_imports
        } else {
            &[]
        };
        let xtests: &[String] = if self.include_test_imports {
            &self.meta.xtest_imports
        } else {
            &[]
        };

        self.meta
            .imports
            .iter()
            .chain(tests)
            .chain(xtests)
            .map(String::as_str)
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("import_path", &self.meta.import_path)
            .field("dir", &self.meta.dir)
            .field("vendored", &self.vendored)
            .field("include_test_imports", &self.include_test_imports)
            .finish()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.meta.import_path)
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.meta.import_path == other.meta.import_path
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.meta.import_path.hash(state);
    }
}
