use thiserror::Error;

/// Errors returned by audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid wav data: {0}")]
    InvalidWav(String),

    #[error("resample error: {0}")]
    Resample(String),

    #[error("unsupported sample format: {bits}-bit {kind}")]
    UnsupportedFormat { kind: &'static str, bits: u16 },
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AudioError::Io(e),
            other => AudioError::InvalidWav(other.to_string()),
        }
    }
}
