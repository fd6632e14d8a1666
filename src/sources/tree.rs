//! Source tree - packages laid out as `<root>/<import path>` directories.
//!
//! [`SourceTree`] is the filesystem import service. An import is looked up
//! in the vendor directories visible from the importing package, then in
//! each source root, then in the standard library root. Files excluded by
//! build constraints for the tree's [`BuildTags`] are not part of a package.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::package::CGO_IMPORT;
use crate::core::PackageMetadata;
use crate::resolver::ResolveError;
use crate::sources::constraint::BuildTags;
use crate::sources::scan;
use crate::sources::source::{ImportResolver, PathMapper};
use crate::util::fs::{list_source_files, slash_relative};

/// Directory holding generate markers under a source root.
const GENERATE_MARKER_DIR: &str = ".zb/generate";

/// Filesystem import service and output layout.
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    roots: Vec<PathBuf>,
    std_root: Option<PathBuf>,
    project_import_path: Option<String>,
    tags: BuildTags,
}

/// A directory an import path may live in.
#[derive(Debug)]
struct Candidate {
    dir: PathBuf,
    root: PathBuf,
    standard: bool,
}

impl SourceTree {
    /// Create a source tree over the given roots, searched in order.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        SourceTree {
            roots,
            ..Default::default()
        }
    }

    /// Set the standard library root.
    pub fn with_std_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.std_root = Some(dir.into());
        self
    }

    /// Set the import path relative imports are resolved against.
    pub fn with_project_import_path(mut self, import_path: impl Into<String>) -> Self {
        self.project_import_path = Some(import_path.into());
        self
    }

    /// Set the target files are selected for; the host by default.
    pub fn with_build_tags(mut self, tags: BuildTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn build_tags(&self) -> &BuildTags {
        &self.tags
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn std_root(&self) -> Option<&Path> {
        self.std_root.as_deref()
    }

    /// The source root `dir` lives under, if any.
    fn containing_root(&self, dir: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .chain(self.std_root.iter())
            .find(|root| dir.starts_with(root))
            .map(PathBuf::as_path)
    }

    fn candidates(&self, import_path: &str, src_dir: &Path) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if let Some(root) = self.roots.iter().find(|root| src_dir.starts_with(root)) {
            for dir in src_dir.ancestors().take_while(|dir| dir.starts_with(root)) {
                candidates.push(Candidate {
                    dir: join_import_path(&dir.join("vendor"), import_path),
                    root: root.clone(),
                    standard: false,
                });
            }
        }

        for root in &self.roots {
            candidates.push(Candidate {
                dir: join_import_path(root, import_path),
                root: root.clone(),
                standard: false,
            });
        }

        if let Some(root) = &self.std_root {
            candidates.push(Candidate {
                dir: join_import_path(root, import_path),
                root: root.clone(),
                standard: true,
            });
        }

        candidates
    }

    fn root_of(&self, meta: &PackageMetadata) -> PathBuf {
        meta.root
            .clone()
            .or_else(|| self.containing_root(&meta.dir).map(Path::to_path_buf))
            .unwrap_or_else(|| meta.dir.clone())
    }
}

impl ImportResolver for SourceTree {
    fn import(&self, import_path: &str, src_dir: &Path) -> Result<PackageMetadata, ResolveError> {
        let import_path = self.normalize(import_path);
        let mut searched = Vec::new();

        for candidate in self.candidates(&import_path, src_dir) {
            if !candidate.dir.is_dir() {
                searched.push(candidate.dir);
                continue;
            }

            let resolved = if candidate.standard {
                import_path.clone()
            } else {
                slash_relative(&candidate.root, &candidate.dir).unwrap_or(import_path)
            };
            tracing::trace!("found {} in {}", resolved, candidate.dir.display());

            return load_package(resolved, candidate, &self.tags);
        }

        Err(ResolveError::NotFound {
            import_path,
            src_dir: src_dir.to_path_buf(),
            searched,
        })
    }

    fn normalize(&self, import_path: &str) -> String {
        let trimmed = import_path.trim_end_matches('/');
        let Some(base) = self.project_import_path.as_deref().filter(|_| is_relative(trimmed))
        else {
            return trimmed.to_string();
        };

        let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
        for part in trimmed.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                part => parts.push(part),
            }
        }
        parts.join("/")
    }
}

impl PathMapper for SourceTree {
    fn dir_to_import_path(&self, dir: &Path) -> String {
        self.containing_root(dir)
            .and_then(|root| slash_relative(root, dir))
            .unwrap_or_else(|| dir.to_string_lossy().into_owned())
    }

    fn install_path(&self, pkg: &PackageMetadata) -> PathBuf {
        let root = self.root_of(pkg);
        if pkg.is_command() {
            root.join("bin").join(pkg.base_name())
        } else {
            join_import_path(&root.join("pkg"), &format!("{}.a", pkg.import_path))
        }
    }

    fn build_path(&self, project_dir: &Path, pkg: &PackageMetadata) -> PathBuf {
        project_dir.join("bin").join(pkg.base_name())
    }

    fn generate_marker_path(&self, pkg: &PackageMetadata, file: &str) -> PathBuf {
        let root = self.root_of(pkg);
        join_import_path(&root.join(GENERATE_MARKER_DIR), &pkg.import_path)
            .join(format!("{file}.stamp"))
    }
}

fn is_relative(import_path: &str) -> bool {
    import_path == "."
        || import_path == ".."
        || import_path.starts_with("./")
        || import_path.starts_with("../")
}

fn join_import_path(base: &Path, import_path: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    path.extend(import_path.split('/').filter(|p| !p.is_empty()));
    path
}

/// Read and classify the files of one package directory.
fn load_package(
    import_path: String,
    candidate: Candidate,
    tags: &BuildTags,
) -> Result<PackageMetadata, ResolveError> {
    let dir = candidate.dir;
    let invalid = |message: String| ResolveError::Invalid {
        import_path: import_path.clone(),
        dir: dir.clone(),
        message,
    };

    let names = list_source_files(&dir).map_err(|e| invalid(e.to_string()))?;

    let mut meta = PackageMetadata::default();
    let mut imports = BTreeSet::new();
    let mut test_imports = BTreeSet::new();
    let mut xtest_imports = BTreeSet::new();
    let mut clauses = BTreeSet::new();
    let mut test_clause = None;

    for name in names {
        let Some((stem, ext)) = name.rsplit_once('.') else {
            continue;
        };
        if !tags.matches_file_name(&name) {
            tracing::trace!("{}: excluded for {}/{}", name, tags.goos(), tags.goarch());
            continue;
        }
        let files = &mut meta.files;

        match ext {
            "go" => {
                let src = fs::read_to_string(dir.join(&name))
                    .map_err(|e| invalid(format!("{name}: {e}")))?;
                if !tags.matches_source(&src).map_err(|e| invalid(format!("{name}: {e}")))? {
                    tracing::trace!("{}: excluded by build constraint", name);
                    continue;
                }
                let clause = scan::package_clause(&src)
                    .ok_or_else(|| invalid(format!("{name}: missing package clause")))?
                    .to_string();
                let file_imports = scan::scan_imports(&src);

                if stem.ends_with("_test") {
                    if clause.ends_with("_test") {
                        xtest_imports.extend(file_imports);
                        files.xtest_sources.push(name);
                    } else {
                        test_imports.extend(file_imports);
                        files.test_sources.push(name);
                    }
                    test_clause.get_or_insert(clause);
                } else {
                    if file_imports.contains(CGO_IMPORT) {
                        files.cgo_sources.push(name);
                    } else {
                        files.sources.push(name);
                    }
                    imports.extend(file_imports);
                    clauses.insert(clause);
                }
            }
            "c" => files.c_sources.push(name),
            "cc" | "cpp" | "cxx" => files.cxx_sources.push(name),
            "m" => files.objc_sources.push(name),
            "h" | "hh" | "hpp" | "hxx" => files.headers.push(name),
            "s" | "S" => files.asm_sources.push(name),
            "swig" => files.swig_sources.push(name),
            "swigcxx" => files.swig_cxx_sources.push(name),
            "syso" => files.object_files.push(name),
            _ => {}
        }
    }

    if clauses.len() > 1 {
        let found: Vec<_> = clauses.into_iter().collect();
        return Err(invalid(format!(
            "found packages {} in {}",
            found.join(", "),
            dir.display()
        )));
    }

    let name = match clauses.into_iter().next().or(test_clause) {
        Some(name) => name.trim_end_matches("_test").to_string(),
        None => return Err(invalid("no source files".to_string())),
    };

    Ok(PackageMetadata {
        name,
        root: Some(candidate.root),
        standard: candidate.standard,
        imports: imports.into_iter().collect(),
        test_imports: test_imports.into_iter().collect(),
        xtest_imports: xtest_imports.into_iter().collect(),
        dir,
        import_path,
        ..meta
    })
}
