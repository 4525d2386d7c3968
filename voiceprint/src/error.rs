use std::path::PathBuf;

use thiserror::Error;
use voxclone_audio::AudioError;

/// Errors returned by embedding extraction and loading.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("reference audio too short: need at least {min_secs:.2}s, got {got_secs:.2}s")]
    TooShort { min_secs: f32, got_secs: f32 },

    #[error("reference audio is silent: {voiced} voiced frames, need {required}")]
    Silent { voiced: usize, required: usize },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("malformed embedding: {0}")]
    Malformed(String),

    #[error("unreadable reference audio: {0}")]
    Audio(#[from] AudioError),

    #[error("cannot load embedding checkpoint {path}: {reason}")]
    Checkpoint { path: PathBuf, reason: String },
}
