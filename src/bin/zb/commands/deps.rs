//! `zb deps` command

use anyhow::Result;

use crate::cli::DepsArgs;
use zb::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: DepsArgs) -> Result<()> {
    let build = ctx.build_context();
    let resolver = build.resolver();

    let pkg = resolver.resolve(&args.import_path, ctx.cwd(), args.test)?;
    for dep in resolver.dependencies(&pkg)? {
        println!("{}", dep.import_path());
    }

    Ok(())
}
