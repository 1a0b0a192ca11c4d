//! `stackwalk closure` command

use anyhow::{Context, Result};

use crate::cli::ClosureArgs;
use stackwalk::core::naming::DistroNaming;
use stackwalk::resolver::{compute_closure, DependencyTables};
use stackwalk::util::fs::read_to_string;

pub fn execute(args: ClosureArgs) -> Result<()> {
    let mut config = super::load_config(None)?;
    if args.mode.is_some() {
        config.closure.mode = args.mode;
    }
    if args.prune_self {
        config.closure.prune_self = true;
    }

    let contents = read_to_string(&args.tables)?;
    let tables: DependencyTables = serde_json::from_str(&contents)
        .with_context(|| format!("invalid dependency tables: {}", args.tables.display()))?;

    let naming = DistroNaming::new(&args.distro);
    let result = compute_closure(&tables, &naming, &config.closure_options());

    super::write_json(&result, args.output.as_deref())
}
