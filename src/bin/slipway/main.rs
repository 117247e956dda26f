//! Slipway CLI - a deployment orchestrator for three-tier serverless stacks

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use slipway::util::shell::{ColorChoice, Shell};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("slipway=debug")
    } else if cli.quiet {
        EnvFilter::new("slipway=warn")
    } else {
        EnvFilter::new("slipway=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let shell = Shell::from_flags(cli.quiet, cli.verbose, color);

    // Execute command
    match cli.command {
        Commands::New(args) => commands::new::execute(args, &shell),
        Commands::Init(args) => commands::init::execute(args, &shell),
        Commands::Deploy(args) => commands::deploy::execute(args, &shell),
        Commands::Destroy(args) => commands::destroy::execute(args, &shell),
        Commands::Outputs(args) => commands::outputs::execute(args),
        Commands::Serve(args) => commands::serve::execute(args, &shell),
        Commands::Graph(args) => commands::graph::execute(args),
        Commands::Doctor(args) => commands::doctor::execute(args, cli.verbose),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
