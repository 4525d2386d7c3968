//! CLI utilities for voxclone.
//!
//! This crate provides configuration loading, well-known paths and result
//! printing for the `voxclone` binary.

pub mod config;
pub mod output;
pub mod paths;

pub use config::{load_config, ServiceConfig};
pub use output::{Output, OutputFormat};
pub use paths::Paths;
