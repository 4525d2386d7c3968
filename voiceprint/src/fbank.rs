use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Configures log mel filterbank extraction.
///
/// Defaults follow the Kaldi conventions used by speaker embedding models:
/// Povey window, 25ms frames, 10ms shift, 20 Hz to Nyquist-400 Hz.
#[derive(Debug, Clone)]
pub struct FbankConfig {
    /// Input sample rate in Hz (default: 16000).
    pub sample_rate: u32,
    /// Number of mel filterbank channels (default: 40).
    pub num_mels: usize,
    /// Frame length in samples (default: 400 = 25ms @ 16kHz).
    pub frame_length: usize,
    /// Frame shift in samples (default: 160 = 10ms @ 16kHz).
    pub frame_shift: usize,
    /// Pre-emphasis coefficient (default: 0.97).
    pub pre_emphasis: f64,
    /// Floor for log energy (default: 1e-10).
    pub energy_floor: f64,
    /// Low cutoff frequency for mel bins (default: 20 Hz).
    pub low_freq: f64,
    /// High cutoff frequency, non-positive = offset from Nyquist (default: -400).
    pub high_freq: f64,
    /// Remove DC offset per frame (default: true).
    pub remove_dc: bool,
}

impl Default for FbankConfig {
    fn default() -> Self {
        Self::for_sample_rate(16000)
    }
}

impl FbankConfig {
    /// Returns the default configuration scaled to `sample_rate`
    /// (25ms frames, 10ms shift).
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        let per_ms = sample_rate as f64 / 1000.0;
        Self {
            sample_rate,
            num_mels: 40,
            frame_length: (25.0 * per_ms).round() as usize,
            frame_shift: (10.0 * per_ms).round() as usize,
            pre_emphasis: 0.97,
            energy_floor: 1e-10,
            low_freq: 20.0,
            high_freq: -400.0,
            remove_dc: true,
        }
    }

    /// Resolves `high_freq` against the Nyquist frequency.
    pub fn resolved_high_freq(&self) -> f64 {
        let nyquist = self.sample_rate as f64 / 2.0;
        if self.high_freq <= 0.0 {
            (nyquist + self.high_freq).max(self.low_freq + 1.0)
        } else {
            self.high_freq.min(nyquist)
        }
    }
}

/// One analysis frame: log mel energies plus the frame's RMS level.
#[derive(Debug, Clone)]
pub struct FbankFrame {
    pub mels: Vec<f32>,
    pub rms: f32,
}

/// A reusable log mel filterbank extractor.
///
/// The window, filterbank and FFT plan are computed once; [`Fbank::compute`]
/// takes `&self` and can be called from many threads.
pub struct Fbank {
    cfg: FbankConfig,
    fft_size: usize,
    window: Vec<f64>,
    filterbank: Vec<Vec<f64>>,
    fft: Arc<dyn Fft<f64>>,
}

impl Fbank {
    pub fn new(cfg: FbankConfig) -> Self {
        let fft_size = cfg.frame_length.max(1).next_power_of_two();
        let window = povey_window(cfg.frame_length);
        let filterbank = mel_filterbank(
            cfg.num_mels,
            fft_size,
            cfg.sample_rate,
            cfg.low_freq,
            cfg.resolved_high_freq(),
        );
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        Self {
            cfg,
            fft_size,
            window,
            filterbank,
            fft,
        }
    }

    pub fn config(&self) -> &FbankConfig {
        &self.cfg
    }

    /// Extracts frames from normalized mono samples.
    ///
    /// Returns `None` if the input is too short for a single frame or the
    /// configuration is degenerate.
    pub fn compute(&self, samples: &[f32]) -> Option<Vec<FbankFrame>> {
        let cfg = &self.cfg;
        if cfg.frame_shift == 0 || cfg.frame_length == 0 || cfg.num_mels == 0 {
            return None;
        }
        if samples.len() < cfg.frame_length {
            return None;
        }

        let num_frames = (samples.len() - cfg.frame_length) / cfg.frame_shift + 1;
        let half_fft = self.fft_size / 2 + 1;
        let mut result = Vec::with_capacity(num_frames);
        let mut buf = vec![Complex::new(0.0f64, 0.0); self.fft_size];
        let mut frame_buf = vec![0.0f64; cfg.frame_length];

        for f in 0..num_frames {
            let offset = f * cfg.frame_shift;
            for (dst, &src) in frame_buf
                .iter_mut()
                .zip(&samples[offset..offset + cfg.frame_length])
            {
                *dst = src as f64;
            }

            let energy: f64 = frame_buf.iter().map(|v| v * v).sum();
            let rms = (energy / cfg.frame_length as f64).sqrt() as f32;

            if cfg.remove_dc {
                let mean: f64 = frame_buf.iter().sum::<f64>() / cfg.frame_length as f64;
                for v in &mut frame_buf {
                    *v -= mean;
                }
            }

            if cfg.pre_emphasis > 0.0 {
                for i in (1..cfg.frame_length).rev() {
                    frame_buf[i] -= cfg.pre_emphasis * frame_buf[i - 1];
                }
                frame_buf[0] *= 1.0 - cfg.pre_emphasis;
            }

            for c in buf.iter_mut() {
                *c = Complex::new(0.0, 0.0);
            }
            for i in 0..cfg.frame_length {
                buf[i] = Complex::new(frame_buf[i] * self.window[i], 0.0);
            }
            self.fft.process(&mut buf);

            let mels = self
                .filterbank
                .iter()
                .map(|filter| {
                    let energy: f64 = filter
                        .iter()
                        .zip(&buf[..half_fft])
                        .map(|(w, c)| w * c.norm_sqr())
                        .sum();
                    energy.max(cfg.energy_floor).ln() as f32
                })
                .collect();

            result.push(FbankFrame { mels, rms });
        }

        Some(result)
    }
}

fn hamming_window(n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Povey window (hamming^0.85) used by Kaldi.
fn povey_window(n: usize) -> Vec<f64> {
    hamming_window(n).into_iter().map(|w| w.powf(0.85)).collect()
}

pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Returns the center frequency in Hz of each of `num_mels` bands spaced
/// evenly on the mel scale between `low_freq` and `high_freq`.
pub fn mel_band_centers(num_mels: usize, low_freq: f64, high_freq: f64) -> Vec<f64> {
    let mel_low = hz_to_mel(low_freq);
    let mel_high = hz_to_mel(high_freq);
    (1..=num_mels)
        .map(|i| mel_to_hz(mel_low + i as f64 * (mel_high - mel_low) / (num_mels + 1) as f64))
        .collect()
}

/// Computes triangular mel filterbank weights as `[num_mels][fft_size/2+1]`.
fn mel_filterbank(
    num_mels: usize,
    fft_size: usize,
    sample_rate: u32,
    low_freq: f64,
    high_freq: f64,
) -> Vec<Vec<f64>> {
    let half_fft = fft_size / 2 + 1;
    let mel_low = hz_to_mel(low_freq);
    let mel_high = hz_to_mel(high_freq);

    let bin_indices: Vec<usize> = (0..num_mels + 2)
        .map(|i| {
            let mel = mel_low + i as f64 * (mel_high - mel_low) / (num_mels + 1) as f64;
            let bin = (mel_to_hz(mel) * fft_size as f64 / sample_rate as f64).floor() as isize;
            bin.clamp(0, half_fft as isize - 1) as usize
        })
        .collect();

    (0..num_mels)
        .map(|m| {
            let mut filter = vec![0.0f64; half_fft];
            let (left, center, right) = (bin_indices[m], bin_indices[m + 1], bin_indices[m + 2]);
            if center > left {
                for (k, w) in filter.iter_mut().enumerate().take(center + 1).skip(left) {
                    *w = (k - left) as f64 / (center - left) as f64;
                }
            }
            if right > center {
                for (k, w) in filter.iter_mut().enumerate().take(right + 1).skip(center) {
                    *w = (right - k) as f64 / (right - center) as f64;
                }
            }
            // Narrow low bands can collapse onto a single bin.
            if left == center && center == right {
                filter[center] = 1.0;
            }
            filter
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f64, n: usize, sample_rate: u32) -> Vec<f32> {
        (0..n)
            .map(|i| (0.5 * (2.0 * PI * freq_hz * i as f64 / sample_rate as f64).sin()) as f32)
            .collect()
    }

    #[test]
    fn fbank_config_default() {
        let cfg = FbankConfig::default();
        assert_eq!(cfg.sample_rate, 16000);
        assert_eq!(cfg.num_mels, 40);
        assert_eq!(cfg.frame_length, 400);
        assert_eq!(cfg.frame_shift, 160);
        assert_eq!(cfg.resolved_high_freq(), 7600.0);
    }

    #[test]
    fn fbank_config_scales_with_rate() {
        let cfg = FbankConfig::for_sample_rate(24000);
        assert_eq!(cfg.frame_length, 600);
        assert_eq!(cfg.frame_shift, 240);
        assert_eq!(cfg.resolved_high_freq(), 11600.0);
    }

    #[test]
    fn compute_too_short() {
        let fb = Fbank::new(FbankConfig::default());
        assert!(fb.compute(&[0.0; 100]).is_none());
    }

    #[test]
    fn compute_silence_frames() {
        let fb = Fbank::new(FbankConfig::default());
        // (800 - 400) / 160 + 1 = 3 frames.
        let frames = fb.compute(&[0.0; 800]).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].mels.len(), 40);
        assert_eq!(frames[0].rms, 0.0);
    }

    #[test]
    fn tone_concentrates_energy() {
        let fb = Fbank::new(FbankConfig::default());
        let frames = fb.compute(&sine(440.0, 16000, 16000)).unwrap();
        // (16000 - 400) / 160 + 1 = 98 frames.
        assert_eq!(frames.len(), 98);
        assert!((frames[10].rms - 0.3535).abs() < 0.01);

        let first = &frames[10].mels;
        let (loudest, _) = first
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
        let centers = mel_band_centers(40, 20.0, 7600.0);
        assert!(
            (centers[loudest] - 440.0).abs() < 150.0,
            "loudest band centered at {} Hz",
            centers[loudest]
        );
    }

    #[test]
    fn mel_hz_roundtrip() {
        for &hz in &[0.0, 100.0, 440.0, 1000.0, 8000.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((hz - back).abs() < 1e-6, "roundtrip failed for {hz}: got {back}");
        }
    }

    #[test]
    fn band_centers_are_increasing() {
        let centers = mel_band_centers(20, 20.0, 8000.0);
        assert_eq!(centers.len(), 20);
        assert!(centers.windows(2).all(|w| w[0] < w[1]));
        assert!(centers[0] > 20.0 && centers[19] < 8000.0);
    }
}
