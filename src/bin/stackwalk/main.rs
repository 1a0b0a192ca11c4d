//! stackwalk CLI - build dependency closures for released stacks

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use stackwalk::ops::BatchError;
use stackwalk::util::diagnostic;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<BatchError>() {
            Some(batch) => diagnostic::emit(&batch.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("stackwalk=debug")
    } else {
        EnvFilter::new("stackwalk=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let progress = !cli.verbose && std::io::stderr().is_terminal();

    // Execute command
    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args, progress),
        Commands::Fetch(args) => commands::fetch::execute(args, progress),
        Commands::Closure(args) => commands::closure::execute(args),
    }
}
