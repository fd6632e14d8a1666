//! Dependencies - the outputs a build operation has to produce.
//!
//! A [`Dependency`] is either the artifact of a package or the stamp file
//! of a source file's generate directives. Each kind knows which further
//! dependencies it needs, which is what target expansion walks.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::BuildContext;
use crate::core::package::{Package, CGO_IMPORT};
use crate::ops::ExpandError;
use crate::resolver::ResolveError;
use crate::sources::scan::generate_directives_in_file;

/// Opaque revision identifier attached to package artifacts.
///
/// Never part of any fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(id: impl Into<String>) -> Self {
        Revision(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The build or install output of a package.
#[derive(Debug, Clone)]
pub struct PackageArtifact {
    /// Import path of the project the operation was requested for
    project_import_path: String,

    /// Directory of that project
    project_dir: PathBuf,

    /// Output path
    path: PathBuf,

    package: Arc<Package>,

    revision: Option<Revision>,
}

impl PackageArtifact {
    /// The installed artifact of `package`.
    pub fn install(
        ctx: &BuildContext,
        package: Arc<Package>,
        project_dir: Option<&Path>,
        revision: Option<Revision>,
    ) -> Self {
        let project_dir = project_dir_or_default(project_dir, &package);

        PackageArtifact {
            project_import_path: ctx.mapper().dir_to_import_path(&project_dir),
            path: ctx.mapper().install_path(package.metadata()),
            project_dir,
            package,
            revision,
        }
    }

    /// The built artifact of `package`.
    ///
    /// Commands build into the project directory; libraries have nowhere to
    /// go but their install location.
    pub fn build(
        ctx: &BuildContext,
        package: Arc<Package>,
        project_dir: Option<&Path>,
        revision: Option<Revision>,
    ) -> Self {
        if !package.is_command() {
            return Self::install(ctx, package, project_dir, revision);
        }

        let project_dir = project_dir_or_default(project_dir, &package);

        PackageArtifact {
            project_import_path: ctx.mapper().dir_to_import_path(&project_dir),
            path: ctx.mapper().build_path(&project_dir, package.metadata()),
            project_dir,
            package,
            revision,
        }
    }

    pub fn project_import_path(&self) -> &str {
        &self.project_import_path
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }

    pub fn revision(&self) -> Option<&Revision> {
        self.revision.as_ref()
    }

    /// Install artifacts of every direct non-standard import, then the
    /// generate markers of this package's sources.
    fn dependencies(&self, ctx: &BuildContext) -> Result<Vec<Dependency>, ExpandError> {
        let pkg = &self.package;
        let mut deps = Vec::new();

        for import in pkg.imports() {
            if import == CGO_IMPORT {
                continue;
            }

            let dep = ctx
                .resolver()
                .resolve(import, pkg.dir(), false)
                .map_err(|e| ResolveError::import(pkg.import_path(), import, e))?;

            // The toolchain ships the standard library prebuilt.
            if dep.is_standard() {
                continue;
            }

            deps.push(Dependency::Package(PackageArtifact::install(
                ctx,
                dep,
                Some(&self.project_dir),
                self.revision.clone(),
            )));
        }

        if !ctx.no_generate() {
            for file in pkg.files().generate_candidates() {
                let source = pkg.dir().join(file);
                let commands =
                    generate_directives_in_file(&source).map_err(|source_err| ExpandError::Io {
                        path: source.clone(),
                        source: source_err,
                    })?;

                if commands.is_empty() {
                    continue;
                }

                deps.push(Dependency::Generate(GenerateMarker {
                    path: ctx.mapper().generate_marker_path(pkg.metadata(), file),
                    package: Arc::clone(pkg),
                    file: file.to_string(),
                    commands,
                }));
            }
        }

        Ok(deps)
    }
}

fn project_dir_or_default(project_dir: Option<&Path>, package: &Package) -> PathBuf {
    match project_dir {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => package.dir().to_path_buf(),
    }
}

/// Stamp recording that one source file's generate directives have run.
#[derive(Debug, Clone)]
pub struct GenerateMarker {
    path: PathBuf,
    package: Arc<Package>,
    file: String,
    commands: Vec<String>,
}

impl GenerateMarker {
    /// Marker path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }

    /// Source file name, relative to the package directory
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Directive commands, in file order
    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

/// Something a build operation needs to exist.
#[derive(Debug, Clone)]
pub enum Dependency {
    Package(PackageArtifact),
    Generate(GenerateMarker),
}

impl Dependency {
    /// Output path; also the identity of the dependency.
    pub fn path(&self) -> &Path {
        match self {
            Dependency::Package(artifact) => artifact.path(),
            Dependency::Generate(marker) => marker.path(),
        }
    }

    /// The package this dependency belongs to.
    pub fn package(&self) -> &Arc<Package> {
        match self {
            Dependency::Package(artifact) => artifact.package(),
            Dependency::Generate(marker) => marker.package(),
        }
    }

    pub fn is_generate(&self) -> bool {
        matches!(self, Dependency::Generate(_))
    }

    /// Short name of the dependency kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Dependency::Package(_) => "package",
            Dependency::Generate(_) => "generate",
        }
    }

    /// Dependencies that must exist before this one can be produced.
    pub fn dependencies(&self, ctx: &BuildContext) -> Result<Vec<Dependency>, ExpandError> {
        match self {
            Dependency::Package(artifact) => artifact.dependencies(ctx),
            Dependency::Generate(_) => Ok(Vec::new()),
        }
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path()
    }
}

impl Eq for Dependency {}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind_name(), self.path().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{PackageFixture, Sandbox};
    use crate::util::config::BuildConfig;

    #[test]
    fn test_install_artifact_of_library() {
        let sandbox = Sandbox::new();
        sandbox.add(PackageFixture::new("example.com/lib").source("lib.go", "package lib\n"));
        let ctx = sandbox.context();
        let pkg = sandbox.resolve(&ctx, "example.com/lib");

        let artifact = PackageArtifact::install(&ctx, pkg, None, None);
        assert_eq!(
            artifact.path(),
            sandbox.root().join("pkg/example.com/lib.a")
        );
        assert_eq!(artifact.project_import_path(), "example.com/lib");
        assert_eq!(artifact.project_dir(), sandbox.root().join("example.com/lib"));
    }

    #[test]
    fn test_build_artifact_of_command_goes_to_project() {
        let sandbox = Sandbox::new();
        sandbox.add(
            PackageFixture::new("example.com/app/cmd/tool")
                .command()
                .source("main.go", "package main\n"),
        );
        let ctx = sandbox.context();
        let pkg = sandbox.resolve(&ctx, "example.com/app/cmd/tool");
        let project = sandbox.root().join("example.com/app");

        let artifact = PackageArtifact::build(&ctx, pkg, Some(&project), None);
        assert_eq!(artifact.path(), project.join("bin/tool"));
        assert_eq!(artifact.project_import_path(), "example.com/app");
    }

    #[test]
    fn test_build_artifact_of_library_is_install() {
        let sandbox = Sandbox::new();
        sandbox.add(PackageFixture::new("example.com/lib").source("lib.go", "package lib\n"));
        let ctx = sandbox.context();
        let pkg = sandbox.resolve(&ctx, "example.com/lib");

        let built = PackageArtifact::build(&ctx, pkg.clone(), None, None);
        let installed = PackageArtifact::install(&ctx, pkg, None, None);
        assert_eq!(built.path(), installed.path());
    }

    #[test]
    fn test_empty_project_dir_defaults_to_package_dir() {
        let sandbox = Sandbox::new();
        sandbox.add(
            PackageFixture::new("example.com/tool")
                .command()
                .source("main.go", "package main\n"),
        );
        let ctx = sandbox.context();
        let pkg = sandbox.resolve(&ctx, "example.com/tool");

        let artifact = PackageArtifact::build(&ctx, pkg, Some(Path::new("")), None);
        assert_eq!(
            artifact.path(),
            sandbox.root().join("example.com/tool/bin/tool")
        );
    }

    #[test]
    fn test_package_dependencies() {
        let sandbox = Sandbox::new();
        sandbox.add(PackageFixture::new("fmt").standard().source("print.go", "package fmt\n"));
        sandbox.add(PackageFixture::new("example.com/b").source("b.go", "package b\n"));
        sandbox.add(
            PackageFixture::new("example.com/a")
                .import("C")
                .import("fmt")
                .import("example.com/b")
                .source("a.go", "package a\n\n//go:generate stringer -type=T\n")
                .cgo_source("cgo.go", "package a\n\nimport \"C\"\n"),
        );
        let ctx = sandbox.context();
        let pkg = sandbox.resolve(&ctx, "example.com/a");
        let revision = Revision::new("abc123");

        let root = Dependency::Package(PackageArtifact::install(
            &ctx,
            pkg,
            None,
            Some(revision.clone()),
        ));
        let deps = root.dependencies(&ctx).unwrap();

        assert_eq!(deps.len(), 2);
        match &deps[0] {
            Dependency::Package(artifact) => {
                assert_eq!(artifact.package().import_path(), "example.com/b");
                assert_eq!(artifact.revision(), Some(&revision));
                assert_eq!(artifact.project_dir(), sandbox.root().join("example.com/a"));
            }
            other => panic!("expected package artifact, got {other}"),
        }
        match &deps[1] {
            Dependency::Generate(marker) => {
                assert_eq!(marker.file(), "a.go");
                assert_eq!(marker.commands(), ["stringer -type=T"]);
                assert_eq!(
                    marker.path(),
                    sandbox
                        .root()
                        .join(".zb/generate/example.com/a/a.go.stamp")
                );
                assert!(marker.path() == deps[1].path());
            }
            other => panic!("expected generate marker, got {other}"),
        }
        assert!(deps[1].dependencies(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_no_generate_skips_markers() {
        let sandbox = Sandbox::new();
        sandbox.add(
            PackageFixture::new("example.com/a")
                .source("a.go", "package a\n//go:generate echo hi\n"),
        );
        let ctx = sandbox.context().with_config(BuildConfig {
            no_generate: true,
            ..Default::default()
        });
        let pkg = sandbox.resolve(&ctx, "example.com/a");

        let root = Dependency::Package(PackageArtifact::install(&ctx, pkg, None, None));
        assert!(root.dependencies(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_source_is_io_error() {
        let sandbox = Sandbox::new();
        sandbox.add(PackageFixture::new("example.com/a").source("a.go", "package a\n"));
        std::fs::remove_file(sandbox.root().join("example.com/a/a.go")).unwrap();
        let ctx = sandbox.context();
        let pkg = sandbox.resolve(&ctx, "example.com/a");

        let root = Dependency::Package(PackageArtifact::install(&ctx, pkg, None, None));
        let err = root.dependencies(&ctx).unwrap_err();
        assert!(matches!(err, ExpandError::Io { .. }));
    }

    #[test]
    fn test_unresolvable_import_names_importer() {
        let sandbox = Sandbox::new();
        sandbox.add(PackageFixture::new("example.com/a").import("example.com/missing"));
        let ctx = sandbox.context();
        let pkg = sandbox.resolve(&ctx, "example.com/a");

        let root = Dependency::Package(PackageArtifact::install(&ctx, pkg, None, None));
        match root.dependencies(&ctx).unwrap_err() {
            ExpandError::Resolve(ResolveError::Import {
                importer,
                import_path,
                ..
            }) => {
                assert_eq!(importer, "example.com/a");
                assert_eq!(import_path, "example.com/missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
