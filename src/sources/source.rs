//! Source traits - the interfaces the engine needs from its surroundings.

use std::path::{Path, PathBuf};

use crate::core::PackageMetadata;
use crate::resolver::ResolveError;

/// Locates and parses packages by import path.
pub trait ImportResolver: Send + Sync {
    /// Load the package named by `import_path`, as seen from `src_dir`.
    ///
    /// `src_dir` is the directory of the importing package; it decides which
    /// vendor directories are visible.
    fn import(&self, import_path: &str, src_dir: &Path) -> Result<PackageMetadata, ResolveError>;

    /// Normalize an import path before it is used as a cache key.
    ///
    /// Must be idempotent.
    fn normalize(&self, import_path: &str) -> String {
        import_path.to_string()
    }
}

/// Maps packages and directories to output locations.
pub trait PathMapper: Send + Sync {
    /// Map a directory back to the import path it is reachable as.
    fn dir_to_import_path(&self, dir: &Path) -> String;

    /// Where `install` places the package's artifact.
    fn install_path(&self, pkg: &PackageMetadata) -> PathBuf;

    /// Where `build` places a command's binary inside a project.
    fn build_path(&self, project_dir: &Path, pkg: &PackageMetadata) -> PathBuf;

    /// Stamp file recording that a source file's generate directives ran.
    fn generate_marker_path(&self, pkg: &PackageMetadata, file: &str) -> PathBuf;
}
