//! Model capabilities for voice cloning.
//!
//! This crate provides:
//! - [`BaseSynthesizer`]: text to speech in a fixed base speaker's voice
//! - [`ToneConverter`]: re-rendering audio with a target speaker's timbre
//! - [`FormantSynthesizer`] and [`SpectralConverter`]: built-in backends
//!   that load their checkpoints from a directory
//!
//! # Example
//!
//! ```rust,ignore
//! use voxclone_speech::{BaseSynthesizer, Device, FormantSynthesizer};
//!
//! let tts = FormantSynthesizer::open(Path::new("checkpoints"), Device::Cpu)?;
//! let base = tts.synthesize("Hello world", 1.0, "en", Path::new("/tmp/base.wav"))?;
//! println!("{:?}", base.duration);
//! ```

mod artifact;
mod convert;
mod device;
mod error;
mod formant;
mod language;
mod spectral;
mod tts;

pub use artifact::AudioArtifact;
pub use convert::ToneConverter;
pub use device::Device;
pub use error::{ConversionError, SynthesisError};
pub use formant::{BaseSpeakerConfig, FormantSynthesizer, BASE_SPEAKERS_DIR};
pub use language::Language;
pub use spectral::{ConverterConfig, SpectralConverter, CONVERTER_DIR};
pub use tts::BaseSynthesizer;

#[cfg(test)]
mod tests;
