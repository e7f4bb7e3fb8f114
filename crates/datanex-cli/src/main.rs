//! Datanex CLI - data quality from the command line.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "datanex=debug,reqwest=warn"
        } else {
            "warn"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Validate {
            file,
            rules,
            clean,
            output,
            json,
        } => commands::validate::run(file, config, rules, clean, output, json),

        Commands::Dedup {
            file,
            method,
            threshold,
            keep,
            merge,
            output,
            json,
        } => commands::dedup::run(
            file,
            config,
            commands::dedup::DedupArgs {
                method,
                threshold,
                keep,
                merge,
                output,
            },
            json,
        ),

        Commands::Patterns {
            file,
            dependencies,
            distribution,
            json,
        } => commands::patterns::run(file, config, dependencies, distribution, json),

        Commands::Profile { file, json } => commands::profile::run(file, config, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
