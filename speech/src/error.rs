use std::path::PathBuf;

use voxclone_audio::AudioError;
use voxclone_voiceprint::EmbeddingError;

/// Error type for base-voice synthesis.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("nothing to pronounce in input text")]
    EmptyText,
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("invalid speed: {0}")]
    InvalidSpeed(f32),
    #[error("utterance would last {requested_secs:.0}s, limit is {max_secs}s")]
    TooLong { requested_secs: f64, max_secs: u32 },
    #[error("cannot load synthesizer checkpoint {path}: {reason}")]
    Checkpoint { path: PathBuf, reason: String },
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("model error: {0}")]
    Model(String),
}

/// Error type for tone color conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("unreadable base audio: {0}")]
    UnreadableBase(AudioError),
    #[error("cannot write converted audio: {0}")]
    Write(AudioError),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("cannot load converter checkpoint {path}: {reason}")]
    Checkpoint { path: PathBuf, reason: String },
    #[error("model error: {0}")]
    Model(String),
}
