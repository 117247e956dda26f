//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Slipway - A deployment orchestrator for three-tier serverless stacks
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress status output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new Slipway project
    New(NewArgs),

    /// Initialize a Slipway project in an existing directory
    Init(InitArgs),

    /// Deploy the stack declared in Slipway.toml
    Deploy(DeployArgs),

    /// Tear down everything the last deploy materialized
    Destroy(DestroyArgs),

    /// Print the outputs recorded by the last deploy
    Outputs(OutputsArgs),

    /// Serve the deployed stack on a local port
    Serve(ServeArgs),

    /// Display the resource graph in materialization order
    Graph(GraphArgs),

    /// Check the environment for the tools a deploy needs
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct NewArgs {
    /// Stack name
    pub name: String,

    /// Directory to create the project in (defaults to name)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitArgs {
    /// Stack name (defaults to the directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Directory to initialize (defaults to current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct DeployArgs {
    /// Port the materialized addresses point at (defaults to [serve] port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct OutputsArgs {
    /// Print a single output value by name
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Port to bind (defaults to [serve] port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args)]
pub struct GraphArgs {
    /// Show the dependency edges of every resource
    #[arg(long)]
    pub edges: bool,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Show details for passing checks too
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
