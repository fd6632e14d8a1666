//! `zb hash` command

use anyhow::Result;
use rayon::prelude::*;

use crate::cli::HashArgs;
use zb::util::diagnostic::emit;
use zb::util::{Diagnostic, GlobalContext};
use zb::{build_fingerprint, lint_fingerprint, test_fingerprint, Fingerprint};

pub fn execute(ctx: &GlobalContext, args: HashArgs) -> Result<()> {
    let build = ctx.build_context();
    let resolver = build.resolver();
    let config = ctx.config();

    let fingerprints = args
        .import_paths
        .par_iter()
        .map(|import_path| -> Result<(String, Fingerprint, bool)> {
            let pkg = resolver.resolve(import_path, ctx.cwd(), args.test)?;
            let cyclic = !args.lint && resolver.in_import_cycle(&pkg)?;
            let fp = if args.test {
                test_fingerprint(resolver, &pkg, &config.test)?
            } else if args.lint {
                lint_fingerprint(&pkg, &config.lint)?
            } else {
                build_fingerprint(resolver, &pkg)?
            };
            Ok((pkg.import_path().to_string(), fp, cyclic))
        })
        .collect::<Result<Vec<_>>>()?;

    for (import_path, fp, cyclic) in fingerprints {
        if cyclic || fp.is_cycle() {
            let warning = Diagnostic::warning(format!("`{}` is part of an import cycle", import_path))
                .with_context("its fingerprint depends on where the cycle is entered");
            emit(&warning, ctx.color());
        }
        println!("{}  {}", fp, import_path);
    }

    Ok(())
}
