//! Command implementations.

pub mod closure;
pub mod fetch;
pub mod resolve;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::SourceArgs;
use stackwalk::core::manifest::TomlManifestParser;
use stackwalk::core::Workspace;
use stackwalk::sources::{GitBackend, RepositoryFetcher};
use stackwalk::util::config::{load_config_for, Config};
use stackwalk::util::fs::write_string;

/// Load config for the current directory and apply command-line overrides.
pub fn load_config(source: Option<&SourceArgs>) -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let mut config = load_config_for(&cwd);

    if let Some(args) = source {
        if args.workspace.is_some() {
            config.fetch.workspace = args.workspace.clone();
        }
        if args.jobs.is_some() {
            config.fetch.jobs = args.jobs;
        }
        if args.manifest.is_some() {
            config.fetch.manifest = args.manifest.clone();
        }
        if args.offline {
            config.fetch.offline = true;
        }
    }

    Ok(config)
}

/// Build a git-backed fetcher from config.
pub fn make_fetcher(config: &Config) -> Result<RepositoryFetcher> {
    let workspace = Workspace::open(config.fetch.workspace.as_deref())?;
    if workspace.is_temporary() {
        tracing::debug!("Working copies go to {}", workspace.root().display());
    } else {
        tracing::info!("Keeping working copies in {}", workspace.root().display());
    }

    let backend = GitBackend::new().offline(config.fetch.offline);
    Ok(RepositoryFetcher::with_backend(workspace, Box::new(backend))
        .parser(Box::new(TomlManifestParser::new(config.manifest_name())))
        .shallow(config.shallow()))
}

/// Write `value` as pretty JSON to `output`, or stdout.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;

    match output {
        Some(path) => write_string(path, &format!("{}\n", json)),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}
