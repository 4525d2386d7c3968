//! Configuration commands.

use clap::{Args, Subcommand};
use voxclone_cli::ServiceConfig;

use super::output;
use crate::Cli;

/// Manage the service configuration.
///
/// Configuration is stored in ~/.voxclone/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Print the resolved configuration, environment overrides included
    Show,
    /// Print the config file path
    Path,
    /// Set a configuration value (e.g. `device cuda:1`)
    Set {
        /// Key as written in the config file
        key: String,
        /// New value; `none` clears optional keys
        value: String,
    },
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli, mut cfg: ServiceConfig) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Show => {
                cfg.apply_env()?;
                output(cli).write(&cfg)
            }
            ConfigSubcommand::Path => {
                println!("{}", cfg.path().display());
                Ok(())
            }
            ConfigSubcommand::Set { key, value } => {
                cfg.set(key, value)?;
                cfg.save()?;
                eprintln!("Set {} in {}", key, cfg.path().display());
                Ok(())
            }
        }
    }
}
