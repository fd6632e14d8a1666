//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use zb::TargetKind;

/// zb - inspect package graphs, fingerprints and build targets
#[derive(Parser)]
#[command(name = "zb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Source root to search; may be repeated (defaults to config, then cwd)
    #[arg(long = "root", value_name = "DIR", global = true)]
    pub roots: Vec<PathBuf>,

    /// Standard library root
    #[arg(long, value_name = "DIR", env = "ZB_STD_ROOT", global = true)]
    pub std_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the transitive dependencies of a package
    Deps(DepsArgs),

    /// Print package fingerprints
    Hash(HashArgs),

    /// Print the targets an operation expands to
    Targets(TargetsArgs),
}

#[derive(Args)]
pub struct DepsArgs {
    /// Import path of the package
    pub import_path: String,

    /// Follow the package's own test imports
    #[arg(long)]
    pub test: bool,
}

#[derive(Args)]
pub struct HashArgs {
    /// Import paths of the packages
    #[arg(required = true)]
    pub import_paths: Vec<String>,

    /// Print test fingerprints
    #[arg(long, conflicts_with = "lint")]
    pub test: bool,

    /// Print lint fingerprints
    #[arg(long)]
    pub lint: bool,
}

#[derive(Args)]
pub struct TargetsArgs {
    /// Operation: build, install or generate
    pub kind: TargetKind,

    /// Import path of the package
    pub import_path: String,

    /// Project directory command binaries are built into
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Keep only the package itself and generate markers
    #[arg(long)]
    pub rebuild_all: bool,

    /// Skip generate directive scanning
    #[arg(long)]
    pub no_generate: bool,

    /// Revision identifier attached to package artifacts
    #[arg(long)]
    pub revision: Option<String>,

    /// Print targets as JSON
    #[arg(long)]
    pub json: bool,
}
