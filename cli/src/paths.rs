//! Path utilities for voxclone.

use std::io;
use std::path::PathBuf;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".voxclone";

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Provides access to the voxclone directory structure.
#[derive(Debug, Clone)]
pub struct Paths {
    /// User's home directory.
    pub home_dir: PathBuf,
}

impl Paths {
    pub fn new() -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not find home directory")
        })?;
        Ok(Self { home_dir })
    }

    /// Returns the base directory (~/.voxclone).
    pub fn base_dir(&self) -> PathBuf {
        self.home_dir.join(DEFAULT_BASE_DIR)
    }

    /// Returns the config file path (~/.voxclone/config.yaml).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir().join(DEFAULT_CONFIG_FILE)
    }
}
