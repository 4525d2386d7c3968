//! Built-in checkpoint layout.
//!
//! ```text
//! <dir>/base_speakers/EN/config.json
//! <dir>/base_speakers/EN/en_default_se.json
//! <dir>/base_speakers/ZH/config.json
//! <dir>/converter/config.json
//! ```

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;
use voxclone_speech::{BaseSynthesizer, Device, FormantSynthesizer, SpectralConverter};
use voxclone_voiceprint::{EmbeddingExtractor, FbankExtractor};

use crate::codec::WorkingFile;
use crate::StartupError;

/// Source speaker embedding, relative to the checkpoint directory.
pub const SOURCE_EMBEDDING: &str = "base_speakers/EN/en_default_se.json";

const CALIBRATION_TEXT: &str = "The quick brown fox jumps over the lazy dog. \
    Every voice carries its color in the vowels it sings.";

/// Files written by [`init`].
#[derive(Debug, Clone)]
pub struct CheckpointFiles {
    pub base_speakers: Vec<PathBuf>,
    pub converter: PathBuf,
    pub source_embedding: PathBuf,
}

/// Writes default configs under `dir` and derives the source embedding by
/// running the extractor over the base speaker's own voice.
pub fn init(dir: &Path) -> Result<CheckpointFiles, StartupError> {
    let base_speakers = FormantSynthesizer::write_default_checkpoint(dir)?;
    let converter = SpectralConverter::write_default_checkpoint(dir)?;

    let synthesizer = FormantSynthesizer::open(dir, Device::Cpu)?;
    let calibration = WorkingFile::new(dir.join(format!(".calibration-{}.wav", Uuid::new_v4().simple())));
    let base = synthesizer.synthesize(CALIBRATION_TEXT, 1.0, "en", calibration.path())?;

    let extractor = FbankExtractor::default();
    let embedding = extractor.extract(&base.path)?;
    let source_embedding = dir.join(SOURCE_EMBEDDING);
    embedding.save(&source_embedding)?;

    info!(
        dir = %dir.display(),
        dim = embedding.dim(),
        "checkpoints initialized"
    );
    Ok(CheckpointFiles {
        base_speakers,
        converter,
        source_embedding,
    })
}

/// Returns true if every file [`init`] writes is present.
pub fn is_complete(dir: &Path) -> bool {
    [
        dir.join("base_speakers/EN/config.json"),
        dir.join("converter/config.json"),
        dir.join(SOURCE_EMBEDDING),
    ]
    .iter()
    .all(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use voxclone_voiceprint::SpeakerEmbedding;

    #[test]
    fn init_writes_complete_layout() {
        let dir = TempDir::new().unwrap();
        assert!(!is_complete(dir.path()));

        let files = init(dir.path()).unwrap();
        assert!(is_complete(dir.path()));
        assert_eq!(files.base_speakers.len(), 2);

        let source = SpeakerEmbedding::load(&files.source_embedding).unwrap();
        assert_eq!(source.dim(), FbankExtractor::default().dimension());

        // Only the checkpoint tree remains; the calibration audio is gone.
        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["base_speakers", "converter"]);
    }

    #[test]
    fn init_is_repeatable() {
        let dir = TempDir::new().unwrap();
        let first = init(dir.path()).unwrap();
        let a = SpeakerEmbedding::load(&first.source_embedding).unwrap();
        init(dir.path()).unwrap();
        let b = SpeakerEmbedding::load(&first.source_embedding).unwrap();
        assert_eq!(a.values(), b.values());
    }
}
