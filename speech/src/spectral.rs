//! Built-in spectral envelope tone converter.

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::debug;
use voxclone_audio::{wav, Pcm};
use voxclone_voiceprint::{fbank::hz_to_mel, mel_band_centers, EmbeddingError, FbankExtractor, SpeakerEmbedding};

use crate::{AudioArtifact, ConversionError, Device, ToneConverter};

/// Directory under the checkpoint root holding the converter config.
pub const CONVERTER_DIR: &str = "converter";

/// Converter parameters, stored as `converter/config.json`.
///
/// The band layout (`num_mels`, `low_freq`, `high_freq`) must match the
/// embedding extractor that produced the embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Fraction of the envelope difference applied (0 keeps the base voice).
    pub strength: f32,
    /// Per-bin gain limit in dB.
    pub max_gain_db: f32,
    /// STFT frame length in samples; the hop is half of it.
    pub frame_size: usize,
    pub num_mels: usize,
    pub low_freq: f64,
    pub high_freq: f64,
    /// Output peak ceiling in full scale.
    pub peak_limit: f32,
    /// Longest base audio accepted before reporting resource exhaustion.
    pub max_input_secs: f32,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            strength: 0.8,
            max_gain_db: 12.0,
            frame_size: 1024,
            num_mels: 40,
            low_freq: 20.0,
            high_freq: 7600.0,
            peak_limit: 0.95,
            max_input_secs: 600.0,
        }
    }
}

impl ConverterConfig {
    fn validate(&self) -> Result<(), String> {
        if self.frame_size < 64 || self.frame_size % 2 != 0 {
            return Err(format!("frame_size {} must be even and at least 64", self.frame_size));
        }
        if !(self.strength.is_finite() && self.strength >= 0.0) {
            return Err(format!("strength {} is out of range", self.strength));
        }
        if !(self.max_gain_db.is_finite() && self.max_gain_db > 0.0) {
            return Err(format!("max_gain_db {} must be positive", self.max_gain_db));
        }
        if !(self.peak_limit > 0.0 && self.peak_limit <= 1.0) {
            return Err(format!("peak_limit {} must be in (0, 1]", self.peak_limit));
        }
        if self.num_mels == 0 || !(self.low_freq >= 0.0 && self.low_freq < self.high_freq) {
            return Err("invalid mel band layout".to_string());
        }
        Ok(())
    }
}

/// [`ToneConverter`] that reshapes the long-term spectral envelope.
///
/// Each embedding value is a mean log-mel level. The converter takes the
/// per-band difference `target - source`, scales it by `strength`, clamps
/// it to `±max_gain_db`, and applies it as a smooth per-bin gain with a
/// sqrt-Hann STFT at 50% overlap.
pub struct SpectralConverter {
    cfg: ConverterConfig,
    band_mels: Vec<f64>,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    device: Device,
}

impl SpectralConverter {
    pub fn new(cfg: ConverterConfig, device: Device) -> Result<Self, ConversionError> {
        cfg.validate().map_err(ConversionError::Model)?;

        let n = cfg.frame_size;
        // sqrt of a periodic Hann; analysis * synthesis sums to one at hop n/2.
        let window = (0..n)
            .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos()).sqrt())
            .collect();
        let band_mels = mel_band_centers(cfg.num_mels, cfg.low_freq, cfg.high_freq)
            .into_iter()
            .map(hz_to_mel)
            .collect();
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);

        Ok(Self {
            cfg,
            band_mels,
            window,
            forward,
            inverse,
            device,
        })
    }

    /// Loads `converter/config.json` under `checkpoint_dir`.
    pub fn open(checkpoint_dir: &Path, device: Device) -> Result<Self, ConversionError> {
        let path = config_path(checkpoint_dir);
        let checkpoint_err = |reason: String| ConversionError::Checkpoint {
            path: path.clone(),
            reason,
        };
        let data = fs::read_to_string(&path).map_err(|e| checkpoint_err(e.to_string()))?;
        let cfg: ConverterConfig = serde_json::from_str(&data).map_err(|e| checkpoint_err(e.to_string()))?;
        cfg.validate().map_err(&checkpoint_err)?;

        let conv = Self::new(cfg, device)?;
        debug!(device = %device, frame_size = conv.cfg.frame_size, "tone converter loaded");
        Ok(conv)
    }

    /// Writes the default converter config.
    pub fn write_default_checkpoint(checkpoint_dir: &Path) -> Result<PathBuf, ConversionError> {
        let path = config_path(checkpoint_dir);
        let checkpoint_err = |reason: String| ConversionError::Checkpoint {
            path: path.clone(),
            reason,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| checkpoint_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&ConverterConfig::default())
            .map_err(|e| checkpoint_err(e.to_string()))?;
        fs::write(&path, json).map_err(|e| checkpoint_err(e.to_string()))?;
        Ok(path)
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.cfg
    }

    /// Fails unless the converter bands line up with the embeddings
    /// `extractor` produces.
    pub fn check_band_layout(&self, extractor: &FbankExtractor) -> Result<(), ConversionError> {
        let (low, high) = extractor.band_range();
        let mels = extractor.config().num_mels;
        let cfg = &self.cfg;
        if mels != cfg.num_mels || (low - cfg.low_freq).abs() > 0.5 || (high - cfg.high_freq).abs() > 0.5 {
            return Err(ConversionError::Model(format!(
                "converter bands ({} mels, {}-{} Hz) do not match extractor ({mels} mels, {low}-{high} Hz)",
                cfg.num_mels, cfg.low_freq, cfg.high_freq
            )));
        }
        Ok(())
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Per-band gains in dB, after strength and clamping.
    pub fn band_gains_db(
        &self,
        source: &SpeakerEmbedding,
        target: &SpeakerEmbedding,
    ) -> Result<Vec<f32>, EmbeddingError> {
        source.ensure_same_shape(target)?;
        if source.dim() != self.cfg.num_mels {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.cfg.num_mels,
                got: source.dim(),
            });
        }
        // Embeddings are natural-log power; 10*log10(e) converts to dB.
        let db_per_neper = 10.0 * std::f32::consts::LOG10_E;
        let max = self.cfg.max_gain_db;
        Ok(source
            .values()
            .iter()
            .zip(target.values())
            .map(|(s, t)| ((t - s) * self.cfg.strength * db_per_neper).clamp(-max, max))
            .collect())
    }

    /// Expands band gains to linear amplitude factors for every FFT bin.
    fn bin_gains(&self, band_db: &[f32], sample_rate: u32) -> Vec<f32> {
        let n = self.cfg.frame_size;
        let mut gains = vec![1.0f32; n];
        for k in 0..=n / 2 {
            let freq = k as f64 * sample_rate as f64 / n as f64;
            let db = interpolate(&self.band_mels, band_db, hz_to_mel(freq));
            let g = 10.0f32.powf(db / 20.0);
            gains[k] = g;
            if k > 0 && k < n / 2 {
                gains[n - k] = g;
            }
        }
        gains
    }

    /// Applies the envelope change to an in-memory buffer.
    pub fn apply(&self, pcm: &Pcm, band_db: &[f32]) -> Pcm {
        let n = self.cfg.frame_size;
        let hop = n / 2;
        let len = pcm.len();
        let gains = self.bin_gains(band_db, pcm.sample_rate());

        let mut padded = vec![0.0f32; hop + len + n];
        padded[hop..hop + len].copy_from_slice(pcm.samples());
        let mut out = vec![0.0f32; padded.len()];
        let frames = (padded.len() - n) / hop + 1;
        let scale = 1.0 / n as f32;
        let mut buf = vec![Complex::new(0.0f32, 0.0); n];

        for f in 0..frames {
            let offset = f * hop;
            for (i, c) in buf.iter_mut().enumerate() {
                *c = Complex::new(padded[offset + i] * self.window[i], 0.0);
            }
            self.forward.process(&mut buf);
            for (c, g) in buf.iter_mut().zip(&gains) {
                *c *= *g;
            }
            self.inverse.process(&mut buf);
            for (i, c) in buf.iter().enumerate() {
                out[offset + i] += c.re * scale * self.window[i];
            }
        }

        let mut samples = out[hop..hop + len].to_vec();
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if peak > self.cfg.peak_limit {
            let g = self.cfg.peak_limit / peak;
            samples.iter_mut().for_each(|s| *s *= g);
        }
        Pcm::new(pcm.sample_rate(), samples)
    }
}

impl ToneConverter for SpectralConverter {
    fn convert(
        &self,
        base: &AudioArtifact,
        source: &SpeakerEmbedding,
        target: &SpeakerEmbedding,
        output: &Path,
    ) -> Result<AudioArtifact, ConversionError> {
        let band_db = self.band_gains_db(source, target)?;
        let pcm = wav::read_file(&base.path).map_err(ConversionError::UnreadableBase)?;

        let secs = pcm.duration().as_secs_f32();
        if secs > self.cfg.max_input_secs {
            return Err(ConversionError::ResourceExhausted(format!(
                "{secs:.1}s of audio exceeds the {:.0}s working budget",
                self.cfg.max_input_secs
            )));
        }

        let converted = self.apply(&pcm, &band_db);
        wav::write_file(output, &converted).map_err(ConversionError::Write)?;
        debug!(
            frames = converted.len(),
            max_gain_db = band_db.iter().fold(0.0f32, |m, g| m.max(g.abs())),
            "tone converted"
        );
        Ok(AudioArtifact {
            path: output.to_path_buf(),
            format: converted.format(),
            duration: converted.duration(),
        })
    }
}

fn config_path(checkpoint_dir: &Path) -> PathBuf {
    checkpoint_dir.join(CONVERTER_DIR).join("config.json")
}

/// Piecewise-linear interpolation over ascending `xs`, flat beyond the ends.
fn interpolate(xs: &[f64], ys: &[f32], x: f64) -> f32 {
    match xs.iter().position(|&c| c >= x) {
        None => ys.last().copied().unwrap_or(0.0),
        Some(0) => ys.first().copied().unwrap_or(0.0),
        Some(i) => {
            let t = ((x - xs[i - 1]) / (xs[i] - xs[i - 1])) as f32;
            ys[i - 1] + t * (ys[i] - ys[i - 1])
        }
    }
}
