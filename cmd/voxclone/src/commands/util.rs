//! Utility functions for CLI commands.

use anyhow::Context;
use voxclone_cli::{load_config, Output, OutputFormat, ServiceConfig};
use voxclone_pipeline::Pipeline;

use crate::Cli;

/// Gets the service configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    load_config(cli.config.as_deref())
}

/// Result printer honoring `--json`.
pub fn output(cli: &Cli) -> Output {
    let format = if cli.json { OutputFormat::Json } else { OutputFormat::Yaml };
    Output::new(format, None)
}

/// Loads the models named by the configuration.
pub fn open_pipeline(cfg: &ServiceConfig) -> anyhow::Result<Pipeline> {
    Pipeline::from_config(&cfg.pipeline_config()).with_context(|| {
        format!(
            "failed to start pipeline with checkpoints in {} (run `voxclone checkpoint init` to create them)",
            cfg.checkpoint_dir.display()
        )
    })
}
