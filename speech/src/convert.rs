//! Tone color conversion.

use std::path::Path;

use voxclone_voiceprint::SpeakerEmbedding;

use crate::{AudioArtifact, ConversionError};

/// Re-renders audio so it carries the timbre of a target speaker.
pub trait ToneConverter: Send + Sync {
    /// Converts `base` from the `source` timbre to the `target` timbre and
    /// writes the result to `output`.
    ///
    /// Malformed or mismatched embeddings and unreadable base audio are
    /// [`ConversionError`]s. Device or memory exhaustion is reported as
    /// [`ConversionError::ResourceExhausted`].
    fn convert(
        &self,
        base: &AudioArtifact,
        source: &SpeakerEmbedding,
        target: &SpeakerEmbedding,
        output: &Path,
    ) -> Result<AudioArtifact, ConversionError>;
}
