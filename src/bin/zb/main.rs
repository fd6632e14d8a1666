//! zb CLI - inspection surface for the zb build engine

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use zb::builder::FingerprintError;
use zb::ops::ExpandError;
use zb::util::diagnostic::emit;
use zb::util::GlobalContext;
use zb::ResolveError;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli, color) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("zb=debug")
    } else {
        EnvFilter::new("zb=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_color(color);
    if !cli.roots.is_empty() {
        ctx.config_mut().paths.roots = cli.roots;
    }
    if cli.std_root.is_some() {
        ctx.config_mut().paths.std_root = cli.std_root;
    }

    match cli.command {
        Commands::Deps(args) => commands::deps::execute(&ctx, args),
        Commands::Hash(args) => commands::hash::execute(&ctx, args),
        Commands::Targets(args) => commands::targets::execute(ctx, args),
    }
}

/// Print an error, as a diagnostic when it comes from package resolution.
fn report(e: &anyhow::Error, color: bool) {
    let resolve = e
        .downcast_ref::<ResolveError>()
        .or_else(|| match e.downcast_ref::<ExpandError>() {
            Some(ExpandError::Resolve(err)) => Some(err),
            _ => None,
        })
        .or_else(|| match e.downcast_ref::<FingerprintError>() {
            Some(FingerprintError::Resolve(err)) => Some(err),
            _ => None,
        });

    match resolve {
        Some(err) => emit(&err.to_diagnostic(), color),
        None => eprintln!("error: {:#}", e),
    }
}
