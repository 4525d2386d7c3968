//! Base-voice text-to-speech.

use std::path::Path;

use crate::{AudioArtifact, SynthesisError};

/// Interface for a base-speaker text-to-speech model.
///
/// The model checkpoint is loaded once at construction and is read-only
/// afterwards, so one instance serves concurrent requests behind an `Arc`.
pub trait BaseSynthesizer: Send + Sync {
    /// Renders `text` in the base speaker's voice to a WAV file at `output`.
    ///
    /// `speed` scales the speaking rate (1.0 is normal). `language` is a tag
    /// such as `en`, `en-US` or `english`. This call is synchronous and may
    /// be long-running; failures are not retried.
    fn synthesize(
        &self,
        text: &str,
        speed: f32,
        language: &str,
        output: &Path,
    ) -> Result<AudioArtifact, SynthesisError>;
}
