//! `stackwalk fetch` command

use anyhow::Result;

use crate::cli::FetchArgs;
use stackwalk::core::naming::DistroNaming;
use stackwalk::core::Catalog;
use stackwalk::ops::{fetch_stacks, FetchOptions};
use stackwalk::resolver::DependencyTables;

pub fn execute(args: FetchArgs, progress: bool) -> Result<()> {
    let config = super::load_config(Some(&args.source))?;
    let catalog = Catalog::load(&args.source.catalog)?;
    let fetcher = super::make_fetcher(&config)?;
    let naming = DistroNaming::new(&args.source.distro);

    let opts = FetchOptions {
        jobs: config.jobs(),
        progress,
    };
    let report = fetch_stacks(&fetcher, &catalog, &naming, &opts)?;

    for (name, manifest) in &report.manifests {
        match manifest {
            Some(manifest) if manifest.project_name != *name => {
                println!("fetched     {} (project {})", name, manifest.project_name)
            }
            Some(_) => println!("fetched     {}", name),
            None if report.skipped.contains(name) => println!("skipped     {}", name),
            None => println!("placeholder {}", name),
        }
    }
    for failure in &report.failures {
        println!("failed      {}", failure.name);
    }

    if let Some(path) = &args.tables {
        let tables = DependencyTables::build(&naming, &report.manifests);
        super::write_json(&tables, Some(path))?;
    }

    report.into_result()?;
    Ok(())
}
