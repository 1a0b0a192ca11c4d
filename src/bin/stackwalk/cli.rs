//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stackwalk::resolver::ClosureMode;

/// stackwalk - build dependency closures for released stacks
#[derive(Parser)]
#[command(name = "stackwalk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every stack and print its build dependency closure
    Resolve(ResolveArgs),

    /// Fetch every stack's manifest and report what was found
    Fetch(FetchArgs),

    /// Compute closures from previously written dependency tables
    Closure(ClosureArgs),
}

/// Options shared by commands that fetch.
#[derive(Args)]
pub struct SourceArgs {
    /// Catalog file listing repositories and release versions
    #[arg(long)]
    pub catalog: PathBuf,

    /// Distro the release belongs to
    #[arg(long, env = "STACKWALK_DISTRO")]
    pub distro: String,

    /// Directory for working copies (defaults to a temporary directory)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Number of parallel fetches
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Don't contact remotes for working copies that already exist
    #[arg(long)]
    pub offline: bool,

    /// Manifest file name inside each repository
    #[arg(long)]
    pub manifest: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Which dependencies make up a package's set
    #[arg(long)]
    pub mode: Option<ClosureMode>,

    /// Remove packages from their own dependency sets
    #[arg(long)]
    pub prune_self: bool,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Write the dependency tables of the fetched stacks to a file
    #[arg(long)]
    pub tables: Option<PathBuf>,
}

#[derive(Args)]
pub struct ClosureArgs {
    /// Dependency tables (JSON, as written by `fetch --tables`)
    #[arg(long)]
    pub tables: PathBuf,

    /// Distro the release belongs to
    #[arg(long, env = "STACKWALK_DISTRO")]
    pub distro: String,

    /// Which dependencies make up a package's set
    #[arg(long)]
    pub mode: Option<ClosureMode>,

    /// Remove packages from their own dependency sets
    #[arg(long)]
    pub prune_self: bool,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
