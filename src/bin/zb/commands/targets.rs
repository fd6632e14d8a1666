//! `zb targets` command

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::cli::TargetsArgs;
use zb::core::Revision;
use zb::util::GlobalContext;
use zb::{expand, Dependency, Target};

/// One target in `--json` output.
#[derive(Serialize)]
struct TargetRow<'a> {
    kind: &'static str,
    path: PathBuf,
    import_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<&'a Revision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commands: Option<&'a [String]>,
}

impl<'a> TargetRow<'a> {
    fn new(target: &'a Target) -> Self {
        let dep = target.dependency();
        let (revision, file, commands) = match dep {
            Dependency::Package(artifact) => (artifact.revision(), None, None),
            Dependency::Generate(marker) => (None, Some(marker.file()), Some(marker.commands())),
        };

        TargetRow {
            kind: dep.kind_name(),
            path: dep.path().to_path_buf(),
            import_path: dep.package().import_path(),
            parent: target.parent().map(|p| p.path().to_path_buf()),
            revision,
            file,
            commands,
        }
    }
}

pub fn execute(mut ctx: GlobalContext, args: TargetsArgs) -> Result<()> {
    {
        let build = &mut ctx.config_mut().build;
        build.rebuild_all |= args.rebuild_all;
        build.no_generate |= args.no_generate;
    }

    let build = ctx.build_context();
    let pkg = build
        .resolver()
        .resolve(&args.import_path, ctx.cwd(), false)?;
    let revision = args.revision.map(Revision::new);

    let targets = expand(
        &build,
        args.kind,
        &pkg,
        args.project_dir.as_deref(),
        revision.as_ref(),
    )?;

    if args.json {
        let rows: Vec<_> = targets.iter().map(|t| TargetRow::new(t)).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for target in &targets {
            println!("{}", target);
        }
    }

    Ok(())
}
