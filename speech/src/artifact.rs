//! Addressable units of synthesized audio.

use std::path::{Path, PathBuf};
use std::time::Duration;

use voxclone_audio::{wav, AudioError, Format};

/// A WAV file produced by a pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub format: Format,
    pub duration: Duration,
}

impl AudioArtifact {
    /// Describes an existing WAV file by reading its header.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let info = wav::probe_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            format: info.format,
            duration: info.duration(),
        })
    }
}
