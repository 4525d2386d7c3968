use std::path::Path;

use voxclone_audio::{resample, wav, Pcm};

use crate::fbank::{Fbank, FbankConfig};
use crate::{EmbeddingError, SpeakerEmbedding};

/// Derives speaker embeddings from reference audio.
///
/// # Thread Safety
///
/// Implementations are shared across concurrent requests behind an `Arc`
/// and must not require `&mut self`.
pub trait EmbeddingExtractor: Send + Sync {
    /// Computes the target embedding of a reference WAV file.
    ///
    /// Too-short, silent or unreadable audio yields an error the caller can
    /// report; it never poisons the extractor.
    fn extract(&self, reference: &Path) -> Result<SpeakerEmbedding, EmbeddingError>;

    /// Returns the dimensionality of produced embeddings.
    fn dimension(&self) -> usize;

    /// Loads the precomputed source (base speaker) embedding.
    ///
    /// Called once at startup; the result is shared read-only afterwards.
    fn load_source_embedding(&self, path: &Path) -> Result<SpeakerEmbedding, EmbeddingError> {
        let embedding = SpeakerEmbedding::load(path)?;
        if embedding.dim() != self.dimension() {
            return Err(EmbeddingError::Checkpoint {
                path: path.to_path_buf(),
                reason: format!(
                    "embedding has {} dims, extractor produces {}",
                    embedding.dim(),
                    self.dimension()
                ),
            });
        }
        Ok(embedding)
    }
}

/// Configuration for [`FbankExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Sample rate audio is converted to before analysis (default: 16000).
    pub analysis_rate: u32,
    /// Number of mel bands, which is also the embedding dimension (default: 40).
    pub num_mels: usize,
    /// Shortest usable reference in seconds (default: 0.5).
    pub min_duration_secs: f32,
    /// Frames below this RMS level count as silence (default: 1e-3, about -60 dBFS).
    pub silence_rms: f32,
    /// Minimum number of voiced frames (default: 10).
    pub min_voiced_frames: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            analysis_rate: 16000,
            num_mels: 40,
            min_duration_secs: 0.5,
            silence_rms: 1e-3,
            min_voiced_frames: 10,
        }
    }
}

/// [`EmbeddingExtractor`] based on the long-term log mel envelope.
///
/// # Pipeline
///
/// 1. WAV -> mono -> resample to the analysis rate
/// 2. Log mel filterbank frames
/// 3. Drop frames below the silence threshold
/// 4. Average the voiced frames and remove the mean level
///
/// The result describes spectral tilt and formant placement independent
/// of loudness, which is what the tone converter consumes.
pub struct FbankExtractor {
    cfg: ExtractorConfig,
    fbank: Fbank,
}

impl FbankExtractor {
    pub fn new(cfg: ExtractorConfig) -> Self {
        let mut fcfg = FbankConfig::for_sample_rate(cfg.analysis_rate);
        fcfg.num_mels = cfg.num_mels;
        Self {
            fbank: Fbank::new(fcfg),
            cfg,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.cfg
    }

    /// Returns the frequency range covered by the mel bands.
    pub fn band_range(&self) -> (f64, f64) {
        let fcfg = self.fbank.config();
        (fcfg.low_freq, fcfg.resolved_high_freq())
    }

    /// Computes an embedding from an in-memory buffer.
    pub fn embed(&self, pcm: &Pcm) -> Result<SpeakerEmbedding, EmbeddingError> {
        let got_secs = pcm.duration().as_secs_f32();
        if got_secs < self.cfg.min_duration_secs {
            return Err(EmbeddingError::TooShort {
                min_secs: self.cfg.min_duration_secs,
                got_secs,
            });
        }

        let pcm = resample(pcm, self.cfg.analysis_rate)?;
        let frames = self.fbank.compute(pcm.samples()).ok_or(EmbeddingError::TooShort {
            min_secs: self.cfg.min_duration_secs,
            got_secs,
        })?;

        let voiced: Vec<_> = frames
            .iter()
            .filter(|f| f.rms >= self.cfg.silence_rms)
            .collect();
        if voiced.len() < self.cfg.min_voiced_frames {
            return Err(EmbeddingError::Silent {
                voiced: voiced.len(),
                required: self.cfg.min_voiced_frames,
            });
        }

        let mut envelope = vec![0.0f64; self.cfg.num_mels];
        for frame in &voiced {
            for (acc, &v) in envelope.iter_mut().zip(&frame.mels) {
                *acc += v as f64;
            }
        }
        let n = voiced.len() as f64;
        let level = envelope.iter().sum::<f64>() / (n * self.cfg.num_mels as f64);
        let values = envelope.iter().map(|&v| (v / n - level) as f32).collect();

        SpeakerEmbedding::new(values)
    }
}

impl Default for FbankExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl EmbeddingExtractor for FbankExtractor {
    fn extract(&self, reference: &Path) -> Result<SpeakerEmbedding, EmbeddingError> {
        let pcm = wav::read_file(reference)?;
        self.embed(&pcm)
    }

    fn dimension(&self) -> usize {
        self.cfg.num_mels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Harmonic-rich voice-like signal with a formant-ish spectral tilt.
    fn voice(sample_rate: u32, secs: f32, f0: f32, tilt: f32) -> Pcm {
        let n = (sample_rate as f32 * secs) as usize;
        let samples = (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (1..=12)
                    .map(|h| (2.0 * PI * f0 * h as f32 * t).sin() / (h as f32).powf(tilt))
                    .sum::<f32>()
                    * 0.1
            })
            .collect();
        Pcm::new(sample_rate, samples)
    }

    #[test]
    fn embedding_has_configured_dimension() {
        let ex = FbankExtractor::default();
        let e = ex.embed(&voice(16000, 1.0, 140.0, 1.0)).unwrap();
        assert_eq!(e.dim(), 40);
        assert_eq!(ex.dimension(), 40);
        let mean: f32 = e.values().iter().sum::<f32>() / 40.0;
        assert!(mean.abs() < 1e-3, "level should be removed, mean = {mean}");
    }

    #[test]
    fn embedding_is_loudness_invariant() {
        let ex = FbankExtractor::default();
        let quiet = voice(16000, 1.0, 140.0, 1.0);
        let mut loud = quiet.clone();
        for s in loud.samples_mut() {
            *s *= 4.0;
        }
        let a = ex.embed(&quiet).unwrap();
        let b = ex.embed(&loud).unwrap();
        for (x, y) in a.values().iter().zip(b.values()) {
            assert!((x - y).abs() < 0.05);
        }
    }

    #[test]
    fn different_voices_differ() {
        let ex = FbankExtractor::default();
        let bright = ex.embed(&voice(22050, 1.0, 220.0, 0.5)).unwrap();
        let dark = ex.embed(&voice(16000, 1.0, 110.0, 2.0)).unwrap();
        let same = ex.embed(&voice(16000, 1.2, 220.0, 0.5)).unwrap();
        let cross = bright.cosine_similarity(&dark).unwrap();
        let self_sim = bright.cosine_similarity(&same).unwrap();
        assert!(self_sim > cross, "self {self_sim} vs cross {cross}");
    }

    #[test]
    fn too_short_is_rejected() {
        let ex = FbankExtractor::default();
        let err = ex.embed(&voice(16000, 0.2, 140.0, 1.0)).unwrap_err();
        assert!(matches!(err, EmbeddingError::TooShort { .. }));
    }

    #[test]
    fn silence_is_rejected() {
        let ex = FbankExtractor::default();
        let err = ex
            .embed(&Pcm::silence(16000, std::time::Duration::from_secs(2)))
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Silent { voiced: 0, .. }));
    }

    #[test]
    fn extract_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.wav");
        wav::write_file(&path, &voice(24000, 1.5, 180.0, 1.0)).unwrap();
        let e = FbankExtractor::default().extract(&path).unwrap();
        assert_eq!(e.dim(), 40);
    }

    #[test]
    fn extract_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.wav");
        std::fs::write(&path, b"not audio").unwrap();
        let err = FbankExtractor::default().extract(&path).unwrap_err();
        assert!(matches!(err, EmbeddingError::Audio(_)));
    }

    #[test]
    fn source_embedding_dimension_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("se.json");
        SpeakerEmbedding::new(vec![0.0; 8]).unwrap().save(&path).unwrap();
        let err = FbankExtractor::default()
            .load_source_embedding(&path)
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Checkpoint { .. }));

        SpeakerEmbedding::new(vec![0.0; 40]).unwrap().save(&path).unwrap();
        assert!(FbankExtractor::default().load_source_embedding(&path).is_ok());
    }
}
