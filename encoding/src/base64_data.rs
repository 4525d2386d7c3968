//! Base64 transport payloads.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

use crate::TransportError;

/// Binary payload carried as standard Base64 text.
///
/// Decoding tolerates a data-URL envelope (`data:audio/wav;base64,...`)
/// and surrounding or embedded ASCII whitespace; encoding always produces
/// bare Base64 without an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TransportData(Vec<u8>);

impl TransportData {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Encodes the payload as bare Base64.
    pub fn encode(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Decodes transport text, stripping any data-URL envelope first.
    ///
    /// An empty payload is an error: a transport value that carries no
    /// bytes is never a usable audio sample.
    pub fn decode(s: &str) -> Result<Self, TransportError> {
        let payload = strip_envelope(s);
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if compact.is_empty() {
            return Err(TransportError::Empty);
        }
        let data = STANDARD.decode(compact.as_bytes())?;
        if data.is_empty() {
            return Err(TransportError::Empty);
        }
        Ok(Self(data))
    }
}

/// Returns the payload part of a transport string.
///
/// Anything up to and including the first comma is treated as an envelope
/// header (`data:<mime>;base64,`). Base64 never contains a comma, so a
/// bare payload is returned unchanged apart from trimming.
pub fn strip_envelope(s: &str) -> &str {
    let s = s.trim();
    match s.split_once(',') {
        Some((_, payload)) => payload.trim(),
        None => s,
    }
}

impl fmt::Display for TransportData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl Serialize for TransportData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for TransportData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TransportVisitor;

        impl<'de> serde::de::Visitor<'de> for TransportVisitor {
            type Value = TransportData;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a base64 string, optionally wrapped in a data URL")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                TransportData::decode(v).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(TransportVisitor)
    }
}

impl Deref for TransportData {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for TransportData {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}

impl From<&[u8]> for TransportData {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

impl From<TransportData> for Vec<u8> {
    fn from(data: TransportData) -> Self {
        data.0
    }
}

impl AsRef<[u8]> for TransportData {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
