//! Audio utilities for the voice cloning pipeline.
//!
//! - [`Format`]: sample rate and channel layout
//! - [`Pcm`]: mono `f32` sample buffer
//! - [`wav`]: WAV probing, decoding, and encoding
//! - [`resample`]: sample rate conversion
//!
//! # Example
//!
//! ```rust
//! use voxclone_audio::{wav, Pcm};
//! use std::time::Duration;
//!
//! let pcm = Pcm::silence(16000, Duration::from_millis(100));
//! let bytes = wav::encode(&pcm).unwrap();
//! let info = wav::probe(&bytes).unwrap();
//! assert_eq!(info.frames, 1600);
//! ```

mod buffer;
mod error;
mod format;
mod resample;
pub mod wav;

pub use buffer::{rms, Pcm};
pub use error::AudioError;
pub use format::Format;
pub use resample::resample;
