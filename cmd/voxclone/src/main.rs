//! voxclone - voice cloning service and command line tool.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use voxclone_cli::ServiceConfig;

mod api;
mod commands;
mod server;

use commands::{CheckpointCommand, CloneCommand, ConfigCommand, ServeCommand};

/// voxclone - clone a voice from a short reference sample.
///
/// Text is first spoken by a base speaker, then its timbre is converted to
/// match the reference voice. Run `voxclone checkpoint init` once before
/// serving or cloning.
///
/// Configuration is stored in ~/.voxclone/config.yaml.
#[derive(Parser)]
#[command(name = "voxclone")]
#[command(about = "Voice cloning service")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.voxclone/config.yaml)
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
    /// Start the HTTP service
    Serve(ServeCommand),
    /// Clone a voice once
    Clone(CloneCommand),
    /// Manage model checkpoints
    Checkpoint(CheckpointCommand),
    /// Manage configuration
    Config(ConfigCommand),
}

/// Logs go to stderr so command output stays pipeable. `RUST_LOG` wins over
/// `--verbose` and the configured level.
fn init_tracing(cli: &Cli, cfg: &ServiceConfig) {
    let default = if cli.verbose {
        "debug"
    } else {
        cfg.log_level.as_deref().unwrap_or("info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = commands::get_config(&cli)?;
    init_tracing(&cli, &cfg);

    match &cli.command {
        Commands::Serve(cmd) => cmd.run(&cli, cfg).await,
        Commands::Clone(cmd) => cmd.run(&cli, cfg).await,
        Commands::Checkpoint(cmd) => cmd.run(&cli, cfg).await,
        Commands::Config(cmd) => cmd.run(&cli, cfg).await,
    }
}
