//! HTTP service command.

use std::sync::Arc;

use clap::Args;
use voxclone_cli::ServiceConfig;

use super::open_pipeline;
use crate::server::{start_server, AppState};
use crate::Cli;

/// Start the HTTP service.
///
/// The listen address comes from the config file; `PORT` overrides its
/// port and `--listen` overrides both.
#[derive(Args)]
pub struct ServeCommand {
    /// Listen address, e.g. :8000 or 127.0.0.1:9000
    #[arg(long)]
    listen: Option<String>,
}

impl ServeCommand {
    pub async fn run(&self, _cli: &Cli, mut cfg: ServiceConfig) -> anyhow::Result<()> {
        cfg.apply_env()?;
        if let Some(listen) = &self.listen {
            cfg.listen = listen.clone();
        }

        let pipeline = open_pipeline(&cfg)?;
        if let Some(parent) = cfg.reference_audio_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let state = AppState::new(Arc::new(pipeline), cfg.reference_audio_path.clone());
        start_server(&cfg.listen, state).await
    }
}
