//! Built-in vowel-formant base speaker.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use voxclone_audio::{wav, Pcm};

use crate::{AudioArtifact, BaseSynthesizer, Device, Language, SynthesisError};

/// Directory under the checkpoint root holding one folder per language.
pub const BASE_SPEAKERS_DIR: &str = "base_speakers";

/// Per-language base speaker parameters, stored as
/// `base_speakers/<LANG>/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseSpeakerConfig {
    pub language: Language,
    pub sample_rate: u32,
    /// Fundamental frequency at the start of an utterance.
    pub pitch_hz: f32,
    /// Duration of one vowel at speed 1.0.
    pub char_ms: u32,
    pub word_gap_ms: u32,
    pub sentence_gap_ms: u32,
    /// Upper bound on rendered harmonics per voiced segment.
    pub harmonics: usize,
    /// Longest utterance rendered in one call.
    pub max_output_secs: u32,
}

impl Default for BaseSpeakerConfig {
    fn default() -> Self {
        Self::for_language(Language::English)
    }
}

impl BaseSpeakerConfig {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::English => Self {
                language,
                sample_rate: 22050,
                pitch_hz: 120.0,
                char_ms: 75,
                word_gap_ms: 60,
                sentence_gap_ms: 250,
                harmonics: 24,
                max_output_secs: DEFAULT_MAX_OUTPUT_SECS,
            },
            Language::Chinese => Self {
                language,
                sample_rate: 22050,
                pitch_hz: 190.0,
                char_ms: 180,
                word_gap_ms: 40,
                sentence_gap_ms: 250,
                harmonics: 24,
                max_output_secs: DEFAULT_MAX_OUTPUT_SECS,
            },
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.sample_rate < 8000 {
            return Err(format!("sample_rate {} is below 8000", self.sample_rate));
        }
        if !(self.pitch_hz.is_finite() && self.pitch_hz > 20.0) {
            return Err(format!("pitch_hz {} is out of range", self.pitch_hz));
        }
        if self.char_ms == 0 {
            return Err("char_ms must be positive".to_string());
        }
        if self.harmonics == 0 {
            return Err("harmonics must be positive".to_string());
        }
        if self.max_output_secs == 0 {
            return Err("max_output_secs must be positive".to_string());
        }
        Ok(())
    }
}

// F1..F3 for /a/ /e/ /i/ /o/ /u/.
const VOWELS: [[f64; 3]; 5] = [
    [730.0, 1090.0, 2440.0],
    [530.0, 1840.0, 2480.0],
    [270.0, 2290.0, 3010.0],
    [570.0, 840.0, 2410.0],
    [300.0, 870.0, 2240.0],
];

const DEFAULT_MAX_OUTPUT_SECS: u32 = 600;

const FORMANT_BANDWIDTH: f64 = 90.0;
const OUTPUT_PEAK: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    Voiced { vowel: usize, samples: usize, gain: f32 },
    Pause(usize),
}

/// [`BaseSynthesizer`] that renders a deterministic vowel-formant voice.
///
/// Every letter or ideograph becomes one voiced segment whose harmonic
/// spectrum is shaped by a vowel's formants; whitespace and punctuation
/// become pauses. Speaking rate scales every duration by `1 / speed`.
pub struct FormantSynthesizer {
    speakers: HashMap<Language, BaseSpeakerConfig>,
    device: Device,
}

impl FormantSynthesizer {
    /// Creates a synthesizer from in-memory speaker configs.
    pub fn new(
        speakers: impl IntoIterator<Item = BaseSpeakerConfig>,
        device: Device,
    ) -> Result<Self, SynthesisError> {
        let mut map = HashMap::new();
        for cfg in speakers {
            cfg.validate().map_err(SynthesisError::Model)?;
            map.insert(cfg.language, cfg);
        }
        if map.is_empty() {
            return Err(SynthesisError::Model("no base speakers configured".to_string()));
        }
        Ok(Self {
            speakers: map,
            device,
        })
    }

    /// Loads every `base_speakers/<LANG>/config.json` present under
    /// `checkpoint_dir`. At least one language must exist.
    pub fn open(checkpoint_dir: &Path, device: Device) -> Result<Self, SynthesisError> {
        let mut speakers = Vec::new();
        for language in [Language::English, Language::Chinese] {
            let path = config_path(checkpoint_dir, language);
            if !path.exists() {
                continue;
            }
            let cfg = load_config(&path)?;
            if cfg.language != language {
                return Err(SynthesisError::Checkpoint {
                    path,
                    reason: format!("declares language {} but lives under {}", cfg.language, language.code()),
                });
            }
            speakers.push(cfg);
        }
        if speakers.is_empty() {
            return Err(SynthesisError::Checkpoint {
                path: checkpoint_dir.join(BASE_SPEAKERS_DIR),
                reason: "no base speaker config found".to_string(),
            });
        }

        let synth = Self::new(speakers, device)?;
        debug!(device = %device, languages = synth.speakers.len(), "base speakers loaded");
        Ok(synth)
    }

    /// Writes default configs for every supported language.
    pub fn write_default_checkpoint(checkpoint_dir: &Path) -> Result<Vec<PathBuf>, SynthesisError> {
        let mut written = Vec::new();
        for language in [Language::English, Language::Chinese] {
            let path = config_path(checkpoint_dir, language);
            let checkpoint_err = |reason: String| SynthesisError::Checkpoint {
                path: path.clone(),
                reason,
            };
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| checkpoint_err(e.to_string()))?;
            }
            let json = serde_json::to_string_pretty(&BaseSpeakerConfig::for_language(language))
                .map_err(|e| checkpoint_err(e.to_string()))?;
            fs::write(&path, json).map_err(|e| checkpoint_err(e.to_string()))?;
            written.push(path);
        }
        Ok(written)
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns the speaker config for a language tag.
    pub fn speaker(&self, language: &str) -> Result<&BaseSpeakerConfig, SynthesisError> {
        let lang: Language = language
            .parse()
            .map_err(SynthesisError::UnsupportedLanguage)?;
        self.speakers
            .get(&lang)
            .ok_or_else(|| SynthesisError::UnsupportedLanguage(language.trim().to_string()))
    }

    /// Renders `text` to memory.
    pub fn render(&self, text: &str, speed: f32, language: &str) -> Result<Pcm, SynthesisError> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(SynthesisError::InvalidSpeed(speed));
        }
        let cfg = self.speaker(language)?;
        let segments = plan(cfg, text, speed)?;
        let voiced = segments
            .iter()
            .filter(|s| matches!(s, Segment::Voiced { .. }))
            .count();
        if voiced == 0 {
            return Err(SynthesisError::EmptyText);
        }

        let total: usize = segments
            .iter()
            .map(|s| match *s {
                Segment::Voiced { samples, .. } | Segment::Pause(samples) => samples,
            })
            .sum();
        let mut out = Vec::with_capacity(total);
        let mut index = 0usize;
        for seg in segments {
            match seg {
                Segment::Pause(n) => out.resize(out.len() + n, 0.0),
                Segment::Voiced { vowel, samples, gain } => {
                    // Slow declination over the utterance plus a small wobble.
                    let progress = index as f64 / voiced as f64;
                    let f0 = cfg.pitch_hz as f64
                        * (1.0 - 0.12 * progress)
                        * (1.0 + 0.05 * (index as f64 * 0.7).sin());
                    render_vowel(&mut out, cfg, f0, &VOWELS[vowel], samples, gain);
                    index += 1;
                }
            }
        }

        let mut pcm = Pcm::new(cfg.sample_rate, out);
        let peak = pcm.peak();
        if peak > 0.0 {
            let scale = OUTPUT_PEAK / peak;
            pcm.samples_mut().iter_mut().for_each(|s| *s *= scale);
        }
        Ok(pcm)
    }
}

impl BaseSynthesizer for FormantSynthesizer {
    fn synthesize(
        &self,
        text: &str,
        speed: f32,
        language: &str,
        output: &Path,
    ) -> Result<AudioArtifact, SynthesisError> {
        let pcm = self.render(text, speed, language)?;
        wav::write_file(output, &pcm)?;
        debug!(
            language = %language,
            chars = text.chars().count(),
            duration_ms = pcm.duration().as_millis() as u64,
            "base speech synthesized"
        );
        Ok(AudioArtifact {
            path: output.to_path_buf(),
            format: pcm.format(),
            duration: pcm.duration(),
        })
    }
}

fn config_path(checkpoint_dir: &Path, language: Language) -> PathBuf {
    checkpoint_dir
        .join(BASE_SPEAKERS_DIR)
        .join(language.code())
        .join("config.json")
}

fn load_config(path: &Path) -> Result<BaseSpeakerConfig, SynthesisError> {
    let checkpoint_err = |reason: String| SynthesisError::Checkpoint {
        path: path.to_path_buf(),
        reason,
    };
    let data = fs::read_to_string(path).map_err(|e| checkpoint_err(e.to_string()))?;
    let cfg: BaseSpeakerConfig = serde_json::from_str(&data).map_err(|e| checkpoint_err(e.to_string()))?;
    cfg.validate().map_err(checkpoint_err)?;
    Ok(cfg)
}

/// Splits `text` into segments, failing before any allocation if the
/// utterance would exceed `max_output_secs`.
fn plan(cfg: &BaseSpeakerConfig, text: &str, speed: f32) -> Result<Vec<Segment>, SynthesisError> {
    let limit = cfg.max_output_secs as f64 * cfg.sample_rate as f64;
    let mut requested = 0.0f64;
    let mut samples = |ms: f32| -> Result<usize, SynthesisError> {
        let n = (ms as f64 / speed as f64 * cfg.sample_rate as f64 / 1000.0).round();
        requested += n;
        if requested > limit {
            return Err(SynthesisError::TooLong {
                requested_secs: requested / cfg.sample_rate as f64,
                max_secs: cfg.max_output_secs,
            });
        }
        Ok(n as usize)
    };
    let mut segments = Vec::new();
    for c in text.chars() {
        if c.is_whitespace() {
            segments.push(Segment::Pause(samples(cfg.word_gap_ms as f32)?));
        } else if matches!(c, '.' | '!' | '?' | '。' | '！' | '？') {
            segments.push(Segment::Pause(samples(cfg.sentence_gap_ms as f32)?));
        } else if c.is_ascii_punctuation() || matches!(c, '，' | '、' | '；' | '：') {
            segments.push(Segment::Pause(samples(cfg.word_gap_ms as f32)?));
        } else if c.is_alphanumeric() {
            let lower = c.to_ascii_lowercase();
            let (vowel, scale, gain) = match lower {
                'a' => (0, 1.0, 1.0),
                'e' => (1, 1.0, 1.0),
                'i' | 'y' => (2, 1.0, 1.0),
                'o' => (3, 1.0, 1.0),
                'u' => (4, 1.0, 1.0),
                _ if c.is_ascii() => ((c as u32 % 5) as usize, 0.6, 0.5),
                // Ideographs and other scripts carry a full syllable.
                _ => ((c as u32 % 5) as usize, 1.0, 1.0),
            };
            segments.push(Segment::Voiced {
                vowel,
                samples: samples(cfg.char_ms as f32 * scale)?.max(1),
                gain,
            });
        }
    }
    Ok(segments)
}

fn render_vowel(
    out: &mut Vec<f32>,
    cfg: &BaseSpeakerConfig,
    f0: f64,
    formants: &[f64; 3],
    samples: usize,
    gain: f32,
) {
    let sr = cfg.sample_rate as f64;
    let nyquist = sr / 2.0;
    let count = ((nyquist * 0.9 / f0) as usize).min(cfg.harmonics).max(1);
    let amps: Vec<f64> = (1..=count)
        .map(|h| {
            let freq = h as f64 * f0;
            let resonance: f64 = formants
                .iter()
                .map(|&f| 1.0 / (1.0 + ((freq - f) / FORMANT_BANDWIDTH).powi(2)))
                .sum();
            resonance / (h as f64).sqrt()
        })
        .collect();

    let ramp = (sr * 0.01) as usize;
    let ramp = ramp.min(samples / 4).max(1);
    for n in 0..samples {
        let t = n as f64 / sr;
        let mut v = 0.0;
        for (h, a) in amps.iter().enumerate() {
            v += a * (2.0 * PI * (h + 1) as f64 * f0 * t).sin();
        }
        let env = if n < ramp {
            n as f64 / ramp as f64
        } else if n >= samples - ramp {
            (samples - n) as f64 / ramp as f64
        } else {
            1.0
        };
        out.push((v * env) as f32 * gain);
    }
}
