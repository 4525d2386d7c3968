//! In-memory mono PCM buffer.

use std::time::Duration;

use crate::Format;

/// Mono audio held as normalized `f32` samples in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pcm {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl Pcm {
    /// Creates a buffer from normalized samples.
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Creates a buffer of `duration` silence.
    pub fn silence(sample_rate: u32, duration: Duration) -> Self {
        let n = Format::mono(sample_rate).frames_in(duration);
        Self::new(sample_rate, vec![0.0; n])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn format(&self) -> Format {
        Format::mono(self.sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut Vec<f32> {
        &mut self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the playback duration.
    pub fn duration(&self) -> Duration {
        self.format().duration(self.samples.len())
    }

    /// Returns the root-mean-square level of the whole buffer.
    pub fn rms(&self) -> f32 {
        rms(&self.samples)
    }

    /// Returns the largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    /// Appends another buffer. Sample rates must match.
    pub fn extend(&mut self, other: &Pcm) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        self.samples.extend_from_slice(&other.samples);
    }

    /// Converts to PCM16 with symmetric clamping.
    pub fn to_i16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|&x| {
                let x = x.clamp(-1.0, 1.0);
                if x >= 0.0 {
                    (x * 32767.0).round() as i16
                } else {
                    (x * 32768.0).round() as i16
                }
            })
            .collect()
    }
}

/// Root-mean-square of a sample slice; 0 for an empty slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}
