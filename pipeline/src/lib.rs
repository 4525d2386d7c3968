//! Voice cloning pipeline.
//!
//! A [`Pipeline`] turns text plus a short reference sample into speech in
//! the reference speaker's timbre:
//!
//! 1. Decode the reference sample into a working file
//! 2. Synthesize the text in the base speaker's voice
//! 3. Extract the target speaker embedding from the reference
//! 4. Convert the base audio from the source to the target timbre
//! 5. Encode the final artifact for transport
//!
//! Every working file is removed when the request ends, whatever the
//! outcome; only the final artifact is kept.
//!
//! # Example
//!
//! ```rust,ignore
//! use voxclone_pipeline::{CloneRequest, Pipeline, PipelineConfig, ReferenceAudio};
//!
//! let pipeline = Pipeline::from_config(&PipelineConfig::default())?;
//! let req = CloneRequest::new("Hello world", ReferenceAudio::Transport(b64))
//!     .with_output_name("greeting");
//! let result = pipeline.clone_voice(&req)?;
//! println!("{} ({:.2}s)", result.output_path.display(), result.duration_seconds);
//! ```

pub mod checkpoint;
pub mod codec;
pub mod device;
mod error;
mod pipeline;
mod request;

pub use device::{Device, DeviceSelection};
pub use error::{CloneError, DecodeError, EncodeError, Stage, StartupError};
pub use pipeline::{CloneResult, Pipeline, PipelineConfig, Providers};
pub use request::{
    generated_output_name, normalize_output_name, CloneRequest, ReferenceAudio, MAX_OUTPUT_NAME_LEN,
    SPEED_RANGE,
};
