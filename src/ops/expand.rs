//! Target expansion: turn one requested operation into every output it needs.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::builder::BuildContext;
use crate::core::{Dependency, Package, PackageArtifact, Revision, Target, TargetKind, TargetSet};
use crate::resolver::ResolveError;

/// Errors that abort an expansion.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to scan `{}` for generate directives", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Expand `kind` on `pkg` into a deduplicated set of targets.
///
/// The first target is the requested output itself; the rest follow in
/// breadth-first discovery order. When the context rebuilds everything,
/// only generate markers are kept besides the root, since the toolchain
/// rebuilds dependencies on its own.
pub fn expand(
    ctx: &BuildContext,
    kind: TargetKind,
    pkg: &Arc<Package>,
    project_dir: Option<&Path>,
    revision: Option<&Revision>,
) -> Result<TargetSet, ExpandError> {
    let revision = revision.cloned();
    let root = match kind {
        TargetKind::Build | TargetKind::Generate => {
            PackageArtifact::build(ctx, Arc::clone(pkg), project_dir, revision)
        }
        TargetKind::Install => PackageArtifact::install(ctx, Arc::clone(pkg), project_dir, revision),
    };

    let mut queue = VecDeque::new();
    queue.push_back(Arc::new(Target::new(Dependency::Package(root), None)));

    let mut targets = TargetSet::new();

    while let Some(target) = queue.pop_front() {
        if !targets.insert(Arc::clone(&target)) {
            tracing::trace!("already planned: {}", target);
            continue;
        }
        tracing::trace!("planned: {}", target);

        for dep in target.dependency().dependencies(ctx)? {
            if ctx.rebuild_all() && !dep.is_generate() {
                continue;
            }
            queue.push_back(Arc::new(Target::new(dep, Some(Arc::clone(&target)))));
        }
    }

    tracing::debug!(
        "expanded {} of {} into {} targets",
        kind,
        pkg.import_path(),
        targets.len()
    );

    Ok(targets)
}
