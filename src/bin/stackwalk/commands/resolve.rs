//! `stackwalk resolve` command

use anyhow::Result;

use crate::cli::ResolveArgs;
use stackwalk::core::Catalog;
use stackwalk::ops::{walk_dependencies, FetchOptions, WalkError, WalkOptions};

pub fn execute(args: ResolveArgs, progress: bool) -> Result<()> {
    let mut config = super::load_config(Some(&args.source))?;
    if args.mode.is_some() {
        config.closure.mode = args.mode;
    }
    if args.prune_self {
        config.closure.prune_self = true;
    }

    let catalog = Catalog::load(&args.source.catalog)?;
    let fetcher = super::make_fetcher(&config)?;

    let opts = WalkOptions {
        fetch: FetchOptions {
            jobs: config.jobs(),
            progress,
        },
        closure: config.closure_options(),
    };

    match walk_dependencies(&fetcher, &catalog, &args.source.distro, &opts) {
        Ok(result) => super::write_json(&result, args.output.as_deref()),
        Err(WalkError::Batch { error, partial }) => {
            tracing::warn!(
                "Computed dependencies for {} package(s) before giving up",
                partial.len()
            );
            Err(error.into())
        }
        Err(WalkError::Other(e)) => Err(e),
    }
}
