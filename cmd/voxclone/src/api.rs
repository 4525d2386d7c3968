//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use voxclone_pipeline::{CloneError, CloneRequest, CloneResult, ReferenceAudio};

fn default_speed() -> f32 {
    1.0
}

fn default_language() -> String {
    "en".to_string()
}

/// Body of `POST /clone`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceCloneRequest {
    pub text: String,
    /// Base64 WAV; the saved reference is used when absent.
    #[serde(default)]
    pub reference_audio: Option<String>,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub output_filename: Option<String>,
}

impl VoiceCloneRequest {
    /// Builds the pipeline request, falling back to `saved` when no inline
    /// reference was sent.
    pub fn into_clone_request(self, saved: Option<ReferenceAudio>) -> Result<CloneRequest, String> {
        let reference = match self.reference_audio.filter(|s| !s.trim().is_empty()) {
            Some(b64) => ReferenceAudio::Transport(b64),
            None => saved.ok_or_else(|| "No reference audio provided and no saved reference audio found".to_string())?,
        };
        let mut req = CloneRequest::new(self.text, reference)
            .with_speed(self.speed)
            .with_language(self.language);
        if let Some(name) = self.output_filename.filter(|s| !s.is_empty()) {
            req = req.with_output_name(name);
        }
        Ok(req)
    }
}

/// Body returned by the clone endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCloneResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub message: String,
}

impl VoiceCloneResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            audio_base64: None,
            output_path: None,
            duration_seconds: None,
            message: message.into(),
        }
    }

    /// Drops the audio payload, for terminal output.
    pub fn without_audio(mut self) -> Self {
        self.audio_base64 = None;
        self
    }
}

impl From<Result<CloneResult, CloneError>> for VoiceCloneResponse {
    fn from(result: Result<CloneResult, CloneError>) -> Self {
        match result {
            Ok(r) => Self {
                success: true,
                audio_base64: Some(r.audio.encode()),
                output_path: Some(r.output_path.display().to_string()),
                duration_seconds: Some(r.duration_seconds),
                message: "Voice cloned successfully".to_string(),
            },
            Err(e) => Self::failure(format!("Voice cloning failed ({}): {e}", e.stage())),
        }
    }
}

/// Body returned by `POST /save-reference-audio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveReferenceResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
