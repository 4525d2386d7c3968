use thiserror::Error;

/// Errors returned when decoding transport text.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("empty payload")]
    Empty,

    #[error("malformed base64: {0}")]
    Malformed(#[from] base64::DecodeError),
}
