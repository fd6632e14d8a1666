//! Test fixtures for common test scenarios.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::builder::BuildContext;
use crate::core::{Package, PackageMetadata};
use crate::resolver::PackageResolver;
use crate::sources::SourceTree;
use crate::test_support::MemoryImporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Source,
    Cgo,
    C,
    Header,
    Test,
    XTest,
}

/// Fixture for a single package.
#[derive(Debug, Clone)]
pub struct PackageFixture {
    import_path: String,
    name: String,
    standard: bool,
    files: Vec<(FileKind, String, String)>,
    imports: Vec<String>,
    test_imports: Vec<String>,
    xtest_imports: Vec<String>,
}

impl PackageFixture {
    /// Create a library fixture named after the last import path element.
    pub fn new(import_path: impl Into<String>) -> Self {
        let import_path = import_path.into();
        let name = import_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .replace('-', "_");

        PackageFixture {
            import_path,
            name,
            standard: false,
            files: Vec::new(),
            imports: Vec::new(),
            test_imports: Vec::new(),
            xtest_imports: Vec::new(),
        }
    }

    /// Make this a command package.
    pub fn command(mut self) -> Self {
        self.name = "main".to_string();
        self
    }

    /// Mark as a standard library package.
    pub fn standard(mut self) -> Self {
        self.standard = true;
        self
    }

    pub fn import(mut self, path: &str) -> Self {
        self.imports.push(path.to_string());
        self
    }

    pub fn test_import(mut self, path: &str) -> Self {
        self.test_imports.push(path.to_string());
        self
    }

    pub fn xtest_import(mut self, path: &str) -> Self {
        self.xtest_imports.push(path.to_string());
        self
    }

    pub fn source(self, name: &str, content: &str) -> Self {
        self.file(FileKind::Source, name, content)
    }

    pub fn cgo_source(self, name: &str, content: &str) -> Self {
        self.file(FileKind::Cgo, name, content)
    }

    pub fn c_source(self, name: &str, content: &str) -> Self {
        self.file(FileKind::C, name, content)
    }

    pub fn header(self, name: &str, content: &str) -> Self {
        self.file(FileKind::Header, name, content)
    }

    pub fn test_source(self, name: &str, content: &str) -> Self {
        self.file(FileKind::Test, name, content)
    }

    pub fn xtest_source(self, name: &str, content: &str) -> Self {
        self.file(FileKind::XTest, name, content)
    }

    fn file(mut self, kind: FileKind, name: &str, content: &str) -> Self {
        self.files.push((kind, name.to_string(), content.to_string()));
        self
    }

    /// Metadata for a package living under `/src`; nothing is written.
    pub fn metadata(&self) -> PackageMetadata {
        self.metadata_in(Path::new("/src"))
    }

    fn metadata_in(&self, root: &Path) -> PackageMetadata {
        let mut meta = PackageMetadata {
            import_path: self.import_path.clone(),
            name: self.name.clone(),
            dir: root.join(&self.import_path),
            root: Some(root.to_path_buf()),
            standard: self.standard,
            imports: self.imports.clone(),
            test_imports: self.test_imports.clone(),
            xtest_imports: self.xtest_imports.clone(),
            ..Default::default()
        };

        for (kind, name, _) in &self.files {
            let list = match kind {
                FileKind::Source => &mut meta.files.sources,
                FileKind::Cgo => &mut meta.files.cgo_sources,
                FileKind::C => &mut meta.files.c_sources,
                FileKind::Header => &mut meta.files.headers,
                FileKind::Test => &mut meta.files.test_sources,
                FileKind::XTest => &mut meta.files.xtest_sources,
            };
            list.push(name.clone());
        }

        meta
    }

    /// Write the files under `root/<import path>` and return the metadata.
    pub fn write(&self, root: &Path) -> PackageMetadata {
        let meta = self.metadata_in(root);
        std::fs::create_dir_all(&meta.dir).unwrap();
        for (_, name, content) in &self.files {
            std::fs::write(meta.dir.join(name), content).unwrap();
        }
        meta
    }
}

/// A temporary source root backed by a [`MemoryImporter`].
pub struct Sandbox {
    tmp: TempDir,
    importer: Arc<MemoryImporter>,
}

impl Sandbox {
    pub fn new() -> Self {
        Sandbox {
            tmp: TempDir::new().unwrap(),
            importer: Arc::new(MemoryImporter::new()),
        }
    }

    /// The source root directory.
    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// The importer shared by every context built from this sandbox.
    pub fn importer(&self) -> &Arc<MemoryImporter> {
        &self.importer
    }

    /// Write a package and register it; returns its directory.
    pub fn add(&self, fixture: PackageFixture) -> PathBuf {
        let meta = fixture.write(self.root());
        let dir = meta.dir.clone();
        self.importer.add(meta);
        dir
    }

    /// Overwrite one file of an already-added package.
    pub fn write_file(&self, import_path: &str, name: &str, content: &str) {
        std::fs::write(self.root().join(import_path).join(name), content).unwrap();
    }

    /// A fresh resolution context over the sandbox.
    pub fn resolver(&self) -> PackageResolver {
        PackageResolver::new(self.importer.clone())
    }

    /// A fresh build context over the sandbox.
    pub fn context(&self) -> BuildContext {
        let mapper = Arc::new(SourceTree::new(vec![self.root().to_path_buf()]));
        BuildContext::new(self.resolver(), mapper)
    }

    /// Resolve a package in `ctx`, with test imports enabled.
    pub fn resolve(&self, ctx: &BuildContext, import_path: &str) -> Arc<Package> {
        ctx.resolver()
            .resolve(import_path, self.root(), true)
            .unwrap()
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}
