//! One-shot clone command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use voxclone_cli::ServiceConfig;
use voxclone_pipeline::{CloneRequest, ReferenceAudio};

use super::{open_pipeline, output};
use crate::api::VoiceCloneResponse;
use crate::Cli;

/// Clone a voice once and print the result (YAML, or JSON with `--json`).
///
/// The output file lands in the configured output directory.
#[derive(Args)]
pub struct CloneCommand {
    /// Text to speak
    #[arg(short, long)]
    text: String,

    /// Reference WAV with the target voice (default: the saved reference)
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// Speaking rate, 1.0 is normal
    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Language of the text (en, zh)
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Output file name (default: generated)
    #[arg(short, long)]
    output: Option<String>,

    /// Include the base64 audio in the printed result
    #[arg(long)]
    with_audio: bool,
}

impl CloneCommand {
    pub async fn run(&self, cli: &Cli, cfg: ServiceConfig) -> anyhow::Result<()> {
        let reference = match &self.reference {
            Some(path) => ReferenceAudio::File(path.clone()),
            None if cfg.reference_audio_path.is_file() => ReferenceAudio::File(cfg.reference_audio_path.clone()),
            None => anyhow::bail!(
                "no --reference given and no saved reference at {}",
                cfg.reference_audio_path.display()
            ),
        };
        let mut req = CloneRequest::new(&self.text, reference)
            .with_speed(self.speed)
            .with_language(&self.language);
        if let Some(name) = &self.output {
            req = req.with_output_name(name);
        }

        let pipeline = Arc::new(open_pipeline(&cfg)?);
        let result = pipeline.clone_voice_async(req).await;
        let failure = result.as_ref().err().map(|e| e.to_string());

        let mut response = VoiceCloneResponse::from(result);
        if !self.with_audio {
            response = response.without_audio();
        }
        output(cli).write(&response)?;

        match failure {
            Some(message) => anyhow::bail!(message),
            None => Ok(()),
        }
    }
}
