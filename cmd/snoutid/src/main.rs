//! snoutid - register and identify dogs by their nose prints.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{IdentifyCommand, ListCommand, QualityCommand, RegisterCommand};

/// snoutid - dog nose identification from the command line.
///
/// Profiles are stored in a local database; configuration lives in
/// ~/.snoutid/config.yaml.
#[derive(Parser)]
#[command(name = "snoutid")]
#[command(about = "Register and identify dogs by their nose prints")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.snoutid/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a photo with the capture quality gate
    Quality(QualityCommand),
    /// Register a dog from nose, paw and two body photos
    Register(RegisterCommand),
    /// Identify a dog from a nose photo
    Identify(IdentifyCommand),
    /// List registered dogs
    List(ListCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Quality(cmd) => cmd.run(&cli),
        Commands::Register(cmd) => cmd.run(&cli, &cfg).await,
        Commands::Identify(cmd) => cmd.run(&cli, &cfg).await,
        Commands::List(cmd) => cmd.run(&cli, &cfg).await,
    }
}
