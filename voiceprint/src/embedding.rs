use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::EmbeddingError;

/// A fixed-shape descriptor of vocal timbre ("tone color").
///
/// Values are finite by construction. Two embeddings are only comparable
/// when their dimensions match.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EmbeddingFile", into = "EmbeddingFile")]
pub struct SpeakerEmbedding {
    values: Vec<f32>,
}

/// On-disk layout: `{ "dim": N, "values": [...] }`.
#[derive(Serialize, Deserialize)]
struct EmbeddingFile {
    dim: usize,
    values: Vec<f32>,
}

impl SpeakerEmbedding {
    /// Creates an embedding, rejecting empty or non-finite vectors.
    pub fn new(values: Vec<f32>) -> Result<Self, EmbeddingError> {
        if values.is_empty() {
            return Err(EmbeddingError::Malformed("empty vector".into()));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(EmbeddingError::Malformed(format!(
                "non-finite value at index {i}"
            )));
        }
        Ok(Self { values })
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Fails with [`EmbeddingError::DimensionMismatch`] unless `other`
    /// has the same shape.
    pub fn ensure_same_shape(&self, other: &SpeakerEmbedding) -> Result<(), EmbeddingError> {
        if self.dim() != other.dim() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dim(),
                got: other.dim(),
            });
        }
        Ok(())
    }

    /// Cosine similarity in `[-1, 1]`; 0 if either vector has zero norm.
    pub fn cosine_similarity(&self, other: &SpeakerEmbedding) -> Result<f32, EmbeddingError> {
        self.ensure_same_shape(other)?;
        let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
        for (&a, &b) in self.values.iter().zip(&other.values) {
            dot += a as f64 * b as f64;
            na += a as f64 * a as f64;
            nb += b as f64 * b as f64;
        }
        if na == 0.0 || nb == 0.0 {
            return Ok(0.0);
        }
        Ok((dot / (na.sqrt() * nb.sqrt())) as f32)
    }

    /// Loads an embedding from a JSON checkpoint.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EmbeddingError> {
        let path = path.as_ref();
        let checkpoint_err = |reason: String| EmbeddingError::Checkpoint {
            path: path.to_path_buf(),
            reason,
        };
        let data = std::fs::read(path).map_err(|e| checkpoint_err(e.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| checkpoint_err(e.to_string()))
    }

    /// Saves the embedding as a JSON checkpoint.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EmbeddingError> {
        let path = path.as_ref();
        let data = serde_json::to_vec_pretty(self).map_err(|e| EmbeddingError::Malformed(e.to_string()))?;
        std::fs::write(path, data).map_err(|e| EmbeddingError::Checkpoint {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Debug for SpeakerEmbedding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeakerEmbedding")
            .field("dim", &self.values.len())
            .finish()
    }
}

impl TryFrom<EmbeddingFile> for SpeakerEmbedding {
    type Error = EmbeddingError;

    fn try_from(file: EmbeddingFile) -> Result<Self, Self::Error> {
        if file.dim != file.values.len() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: file.dim,
                got: file.values.len(),
            });
        }
        Self::new(file.values)
    }
}

impl From<SpeakerEmbedding> for EmbeddingFile {
    fn from(e: SpeakerEmbedding) -> Self {
        Self {
            dim: e.values.len(),
            values: e.values,
        }
    }
}
