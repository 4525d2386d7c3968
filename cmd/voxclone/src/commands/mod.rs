//! CLI commands module.

mod checkpoint;
mod clone;
mod config;
mod serve;
mod util;

pub use checkpoint::CheckpointCommand;
pub use clone::CloneCommand;
pub use config::ConfigCommand;
pub use serve::ServeCommand;

pub(crate) use util::*;
