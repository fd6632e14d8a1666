//! Package fingerprinting for incremental builds.
//!
//! A fingerprint is a digest of everything that can change the outcome of
//! building, testing or linting a package. There are three flavors and each
//! is seeded with its own tag, so they never collide:
//!
//! - `pkg`: the package's build inputs plus the fingerprint of every
//!   transitive dependency.
//! - `test`: test flags, the package's own build fingerprint, the build
//!   fingerprints of its test imports, and the test sources.
//! - `lint`: lint arguments and the package's own sources only. A change in
//!   a dependency never invalidates a lint result.
//!
//! Each flavor is memoized on the package. Re-entering a computation that is
//! already running on the same thread yields [`Fingerprint::Cycle`] instead
//! of recursing forever, and so does waiting on another thread whose
//! computation is in turn waiting on this one. A computation that fails leaves the slot poisoned,
//! and the package reports [`Fingerprint::Cycle`] for that flavor until the
//! resolution context is dropped.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::core::package::CGO_IMPORT;
use crate::core::Package;
use crate::resolver::{PackageResolver, ResolveError};
use crate::util::config::{LintConfig, TestConfig};
use crate::util::{Claim, DigestBuilder, Memo, MemoGuard};

const CYCLE: &str = "cycle";

/// A computed fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// Lowercase hex SHA-256 digest
    Digest(String),
    /// The computation re-entered itself or failed earlier
    Cycle,
}

impl Fingerprint {
    /// Render as a string; `cycle` for [`Fingerprint::Cycle`].
    pub fn as_str(&self) -> &str {
        match self {
            Fingerprint::Digest(digest) => digest,
            Fingerprint::Cycle => CYCLE,
        }
    }

    /// Check if this is the cycle marker.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Fingerprint::Cycle)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error while computing a fingerprint.
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to hash `{}` of package `{package}`", path.display())]
    Io {
        package: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Claim a fingerprint slot, or return the value it already settled on.
fn begin(memo: &Memo<Fingerprint>) -> Result<MemoGuard<'_, Fingerprint>, Fingerprint> {
    match memo.claim() {
        Claim::Vacant(slot) => Ok(slot),
        Claim::Ready(fp) => Err(fp),
        Claim::Reentered | Claim::Poisoned => Err(Fingerprint::Cycle),
    }
}

fn hash_files(
    digest: &mut DigestBuilder,
    pkg: &Package,
    files: &[&str],
) -> Result<(), FingerprintError> {
    for name in files {
        digest
            .update_file(pkg.dir(), name)
            .map_err(|source| FingerprintError::Io {
                package: pkg.import_path().to_string(),
                path: pkg.dir().join(name),
                source,
            })?;
    }
    Ok(())
}

fn finish(
    pkg: &Package,
    flavor: &str,
    digest: DigestBuilder,
    slot: MemoGuard<'_, Fingerprint>,
) -> Fingerprint {
    let fp = Fingerprint::Digest(digest.finish());
    tracing::debug!("{} fingerprint of {}: {}", flavor, pkg.import_path(), fp);
    slot.fill(fp.clone());
    fp
}

/// Fingerprint of the package's build inputs and all transitive dependencies.
pub fn build_fingerprint(
    resolver: &PackageResolver,
    pkg: &Arc<Package>,
) -> Result<Fingerprint, FingerprintError> {
    let slot = match begin(&pkg.build_fingerprint) {
        Ok(slot) => slot,
        Err(fp) => return Ok(fp),
    };

    let deps = resolver.dependencies(pkg)?;

    let mut digest = DigestBuilder::new();
    digest.line("pkg");

    for dep in &deps {
        let fp = build_fingerprint(resolver, dep)?;
        digest.line(format!("import {}", fp));
    }

    hash_files(&mut digest, pkg, &pkg.files().build_inputs())?;

    Ok(finish(pkg, "build", digest, slot))
}

/// Fingerprint of everything that can change the package's test results.
///
/// Test imports are resolved as fresh records with test imports enabled,
/// independent of the cached records the build fingerprint uses.
pub fn test_fingerprint(
    resolver: &PackageResolver,
    pkg: &Arc<Package>,
    config: &TestConfig,
) -> Result<Fingerprint, FingerprintError> {
    let slot = match begin(&pkg.test_fingerprint) {
        Ok(slot) => slot,
        Err(fp) => return Ok(fp),
    };

    let mut digest = DigestBuilder::new();
    digest.line("test");

    if config.race {
        digest.line("-race");
    }
    if config.short {
        digest.line("-short");
    }
    if config.verbose {
        digest.line("-v");
    }

    let own = build_fingerprint(resolver, pkg)?;
    digest.line(format!("pkg {}", own));

    let imports = [
        ("testimport", pkg.test_imports()),
        ("xtestimport", pkg.xtest_imports()),
    ];

    for (kind, paths) in imports {
        for import_path in paths.iter().filter(|p| *p != CGO_IMPORT) {
            let dep = resolver
                .resolve_fresh(import_path, pkg.dir(), true)
                .map_err(|e| ResolveError::import(pkg.import_path(), import_path.as_str(), e))?;
            let fp = build_fingerprint(resolver, &dep)?;
            digest.line(format!("{} {}", kind, fp));
        }
    }

    hash_files(&mut digest, pkg, &pkg.files().test_inputs())?;

    Ok(finish(pkg, "test", digest, slot))
}

/// Fingerprint of the package's own sources as seen by the linter.
pub fn lint_fingerprint(
    pkg: &Package,
    config: &LintConfig,
) -> Result<Fingerprint, FingerprintError> {
    let slot = match begin(&pkg.lint_fingerprint) {
        Ok(slot) => slot,
        Err(fp) => return Ok(fp),
    };

    let mut digest = DigestBuilder::new();
    digest.line("lint");

    for arg in config.lint_args() {
        digest.line(arg);
    }

    hash_files(&mut digest, pkg, &pkg.files().lint_inputs(!config.no_tests))?;

    Ok(finish(pkg, "lint", digest, slot))
}
