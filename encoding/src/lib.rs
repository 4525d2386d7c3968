//! Transport encoding for binary payloads.
//!
//! Audio crosses the service boundary as Base64 text, sometimes wrapped in
//! a data URL by browser clients. [`TransportData`] decodes both forms and
//! serializes back to bare Base64 in JSON.
//!
//! # Example
//!
//! ```rust
//! use voxclone_encoding::TransportData;
//!
//! let data = TransportData::decode("data:audio/wav;base64,aGVsbG8=").unwrap();
//! assert_eq!(data.as_bytes(), b"hello");
//! assert_eq!(data.encode(), "aGVsbG8=");
//! ```

mod base64_data;
mod error;

pub use base64_data::{strip_envelope, TransportData};
pub use error::TransportError;
