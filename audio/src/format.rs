//! Audio format description.

use std::time::Duration;

/// Describes the layout of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Sample rate in Hz (e.g., 16000, 22050).
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl Format {
    /// Creates a mono format with the given sample rate.
    pub const fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }

    /// Creates a format with an explicit channel count.
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Returns true if the format has a single channel.
    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    /// Returns the playback duration of `frames` sample frames.
    pub fn duration(&self, frames: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    /// Returns the number of sample frames in `duration`.
    pub fn frames_in(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * self.sample_rate as f64).round() as usize
    }
}

// Common format presets
impl Format {
    /// 16kHz mono (speaker embedding input)
    pub const MONO_16K: Format = Format::mono(16000);
    /// 22.05kHz mono (base speaker output)
    pub const MONO_22K: Format = Format::mono(22050);
    /// 24kHz mono
    pub const MONO_24K: Format = Format::mono(24000);
}
