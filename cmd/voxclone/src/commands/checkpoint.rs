//! Checkpoint management commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde::Serialize;
use voxclone_cli::ServiceConfig;
use voxclone_pipeline::checkpoint;

use super::output;
use crate::Cli;

/// Manage model checkpoints.
///
/// The built-in backends read small JSON configs from the checkpoint
/// directory (default from the config file).
#[derive(Args)]
pub struct CheckpointCommand {
    #[command(subcommand)]
    command: CheckpointSubcommand,
}

#[derive(Subcommand)]
enum CheckpointSubcommand {
    /// Write the built-in checkpoints and derive the source embedding
    Init {
        /// Checkpoint directory
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Rewrite checkpoints that already exist
        #[arg(long)]
        force: bool,
    },
    /// Show whether the checkpoint directory is complete
    Status {
        /// Checkpoint directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct CheckpointStatus {
    dir: String,
    complete: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    written: Vec<String>,
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

impl CheckpointCommand {
    pub async fn run(&self, cli: &Cli, cfg: ServiceConfig) -> anyhow::Result<()> {
        match &self.command {
            CheckpointSubcommand::Init { dir, force } => {
                let dir = dir.clone().unwrap_or(cfg.checkpoint_dir);
                let mut written = Vec::new();
                if *force || !checkpoint::is_complete(&dir) {
                    let init_dir = dir.clone();
                    let files = tokio::task::spawn_blocking(move || checkpoint::init(&init_dir)).await??;
                    written.extend(files.base_speakers.iter().map(|p| display(p)));
                    written.push(display(&files.converter));
                    written.push(display(&files.source_embedding));
                } else {
                    eprintln!("Checkpoints already present, use --force to rewrite them");
                }
                output(cli).write(&CheckpointStatus {
                    dir: display(&dir),
                    complete: checkpoint::is_complete(&dir),
                    written,
                })
            }
            CheckpointSubcommand::Status { dir } => {
                let dir = dir.clone().unwrap_or(cfg.checkpoint_dir);
                output(cli).write(&CheckpointStatus {
                    complete: checkpoint::is_complete(&dir),
                    dir: display(&dir),
                    written: Vec::new(),
                })
            }
        }
    }
}
