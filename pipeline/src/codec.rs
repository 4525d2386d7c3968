//! Transport encoding and working files.
//!
//! Reference audio arrives base64-encoded (optionally wrapped in a data
//! URL). [`decode`] validates it and materializes a [`WorkingFile`];
//! [`encode`] turns a finished artifact back into transport form.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use voxclone_audio::wav;
use voxclone_encoding::TransportData;

use crate::error::{DecodeError, EncodeError};

/// A file owned by one request, deleted when dropped.
///
/// Deletion failures are logged as cleanup warnings and never propagate.
/// [`WorkingFile::persist`] moves the file out of the guard's care.
#[derive(Debug)]
pub struct WorkingFile {
    path: PathBuf,
    keep: bool,
}

impl WorkingFile {
    /// Takes ownership of `path`, which need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keep: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically renames the file to `dest` and releases it from cleanup.
    ///
    /// An existing file at `dest` is replaced.
    pub fn persist(mut self, dest: &Path) -> io::Result<PathBuf> {
        fs::rename(&self.path, dest)?;
        self.keep = true;
        Ok(dest.to_path_buf())
    }
}

impl Drop for WorkingFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "working file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "cleanup warning: failed to remove working file"
            ),
        }
    }
}

/// Decodes transport-encoded reference audio into a working file at `dest`.
///
/// Nothing is written unless the payload decodes and parses as WAV.
pub fn decode(transport: &str, dest: impl Into<PathBuf>) -> Result<WorkingFile, DecodeError> {
    let data = TransportData::decode(transport)?;
    stage_bytes(data.as_bytes(), dest)
}

/// Validates raw WAV bytes and writes them to a working file at `dest`.
pub fn stage_bytes(bytes: &[u8], dest: impl Into<PathBuf>) -> Result<WorkingFile, DecodeError> {
    let info = wav::probe(bytes).map_err(DecodeError::InvalidWav)?;
    let file = WorkingFile::new(dest);
    fs::write(file.path(), bytes).map_err(|source| DecodeError::Write {
        path: file.path().to_path_buf(),
        source,
    })?;
    debug!(
        path = %file.path().display(),
        sample_rate = info.format.sample_rate,
        channels = info.format.channels,
        duration_ms = info.duration().as_millis() as u64,
        "reference audio staged"
    );
    Ok(file)
}

/// Copies a WAV file on disk into a working file at `dest`.
pub fn stage_file(src: &Path, dest: impl Into<PathBuf>) -> Result<WorkingFile, DecodeError> {
    let bytes = fs::read(src).map_err(|source| DecodeError::Read {
        path: src.to_path_buf(),
        source,
    })?;
    stage_bytes(&bytes, dest)
}

/// Reads an artifact fully and base64-encodes it.
pub fn encode(path: &Path) -> Result<TransportData, EncodeError> {
    let bytes = fs::read(path).map_err(|source| EncodeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(TransportData::new(bytes))
}

/// Returns the playback duration of a WAV file in seconds, or `0.0` if it
/// cannot be determined.
pub fn duration(path: &Path) -> f64 {
    match wav::file_duration(path) {
        Ok(secs) => secs,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot determine duration, reporting 0");
            0.0
        }
    }
}

/// Validates WAV bytes and atomically stores them at `dest`, replacing any
/// previous file. Used for the persisted reference sample.
pub fn store(bytes: &[u8], dest: &Path) -> Result<PathBuf, DecodeError> {
    let staging = dest.with_file_name(format!(
        ".{}.{}.partial",
        dest.file_name().and_then(|n| n.to_str()).unwrap_or("upload"),
        uuid::Uuid::new_v4().simple()
    ));
    let file = stage_bytes(bytes, staging)?;
    file.persist(dest).map_err(|source| DecodeError::Write {
        path: dest.to_path_buf(),
        source,
    })
}
