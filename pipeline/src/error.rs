use std::fmt;
use std::io;
use std::path::PathBuf;

use voxclone_audio::AudioError;
use voxclone_encoding::TransportError;
use voxclone_speech::{ConversionError, SynthesisError};
use voxclone_voiceprint::EmbeddingError;

/// States of a single clone request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Decoding,
    Synthesizing,
    Extracting,
    Converting,
    Encoding,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Decoding => "decoding",
            Stage::Synthesizing => "synthesizing",
            Stage::Extracting => "extracting",
            Stage::Converting => "converting",
            Stage::Encoding => "encoding",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Reference audio could not be turned into a working file.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid transport encoding: {0}")]
    Transport(#[from] TransportError),
    #[error("reference audio is not a readable WAV: {0}")]
    InvalidWav(AudioError),
    #[error("cannot read reference audio {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write working file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// The final artifact could not be read back or put in place.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("cannot read output artifact {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot move output artifact to {path}: {source}")]
    Persist { path: PathBuf, source: io::Error },
}

/// Error type for a clone request.
///
/// Every variant maps to the stage that produced it; see [`CloneError::stage`].
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("embedding extraction failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("conversion failed: {0}")]
    Conversion(ConversionError),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),
}

impl From<ConversionError> for CloneError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::ResourceExhausted(msg) => CloneError::ResourceExhausted(msg),
            other => CloneError::Conversion(other),
        }
    }
}

impl CloneError {
    /// Returns the stage the request was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            CloneError::Validation(_) => Stage::Idle,
            CloneError::Decode(_) => Stage::Decoding,
            CloneError::Synthesis(_) => Stage::Synthesizing,
            CloneError::Embedding(_) => Stage::Extracting,
            CloneError::Conversion(_) | CloneError::ResourceExhausted(_) => Stage::Converting,
            CloneError::Encode(_) => Stage::Encoding,
        }
    }

    /// Returns true if the same request may succeed when retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CloneError::ResourceExhausted(_))
    }
}

/// Error type for building a [`Pipeline`](crate::Pipeline).
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("base synthesizer: {0}")]
    Synthesizer(#[from] SynthesisError),
    #[error("tone converter: {0}")]
    Converter(#[from] ConversionError),
    #[error("source embedding: {0}")]
    SourceEmbedding(#[from] EmbeddingError),
    #[error("cannot create directory {path}: {source}")]
    Directory { path: PathBuf, source: io::Error },
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        assert_eq!(CloneError::Validation("x".into()).stage(), Stage::Idle);
        assert_eq!(
            CloneError::from(DecodeError::Transport(TransportError::Empty)).stage(),
            Stage::Decoding
        );
        assert_eq!(
            CloneError::from(SynthesisError::EmptyText).stage(),
            Stage::Synthesizing
        );
        assert_eq!(
            CloneError::from(EmbeddingError::Silent { voiced: 0, required: 10 }).stage(),
            Stage::Extracting
        );
        assert_eq!(
            CloneError::from(ConversionError::Model("x".into())).stage(),
            Stage::Converting
        );
    }

    #[test]
    fn test_resource_exhaustion_is_distinct() {
        let err = CloneError::from(ConversionError::ResourceExhausted("oom".into()));
        assert!(matches!(err, CloneError::ResourceExhausted(_)));
        assert!(err.is_retryable());
        assert_eq!(err.stage(), Stage::Converting);

        let err = CloneError::from(ConversionError::Model("bad".into()));
        assert!(matches!(err, CloneError::Conversion(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_messages_name_stage() {
        let err = CloneError::from(DecodeError::Transport(TransportError::Empty));
        assert!(err.to_string().starts_with("decode failed"));
        assert_eq!(Stage::Synthesizing.to_string(), "synthesizing");
    }
}
