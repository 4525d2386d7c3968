//! Speaker embeddings ("tone color") for voice cloning.
//!
//! # Architecture
//!
//! 1. [`EmbeddingExtractor::extract`]: reference WAV -> [`SpeakerEmbedding`]
//! 2. [`EmbeddingExtractor::load_source_embedding`]: JSON checkpoint ->
//!    the base speaker's [`SpeakerEmbedding`], loaded once at startup
//!
//! # Feature Extraction
//!
//! The [`fbank`] module provides Kaldi-style log mel filterbank extraction:
//! - Povey window (hamming^0.85)
//! - Pre-emphasis 0.97
//! - FFT via `rustfft`
//! - Mel triangular filterbank
//!
//! [`FbankExtractor`] averages voiced frames into a level-normalized
//! spectral envelope, one value per mel band.

mod embedding;
mod error;
mod extractor;
pub mod fbank;

pub use embedding::SpeakerEmbedding;
pub use error::EmbeddingError;
pub use extractor::{EmbeddingExtractor, ExtractorConfig, FbankExtractor};
pub use fbank::{mel_band_centers, Fbank, FbankConfig, FbankFrame};
