//! Record and result types, and the fixed-width vector encoding.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metadata::Metadata;

/// Number of results returned when the caller does not pick `top_k`.
pub const DEFAULT_TOP_K: usize = 5;

/// Width of one encoded vector element in bytes.
pub const ELEMENT_WIDTH: usize = std::mem::size_of::<f32>();

/// A vector with its id and metadata, as handed to `upsert`.
///
/// The collection is supplied beside the record; together they form the
/// record's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VectorRecord {
    /// Creates a record with empty metadata.
    ///
    /// # Example
    ///
    /// ```
    /// use embedvault_core::{Metadata, VectorRecord};
    ///
    /// let record = VectorRecord::new("doc-1", vec![0.1, 0.2, 0.3])
    ///     .with_metadata(Metadata::new().with_field("title", "Intro"));
    /// assert_eq!(record.dimension(), 3);
    /// ```
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: Metadata::new(),
        }
    }

    /// Replaces the metadata. Chainable.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.values.len()
    }
}

/// One ranked hit returned by `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: String,
    /// Cosine similarity in `[-1, 1]`; higher is closer.
    pub score: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl QueryResult {
    pub fn new(id: impl Into<String>, score: f64, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            score,
            metadata,
        }
    }
}

/// Encodes values as consecutive 4-byte little-endian IEEE-754 floats.
pub fn encode_vector(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * ELEMENT_WIDTH);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decodes bytes produced by [`encode_vector`].
///
/// Fails with [`Error::Serialization`] if the length is not a multiple of four.
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % ELEMENT_WIDTH != 0 {
        return Err(Error::Serialization(format!(
            "vector byte length {} is not a multiple of {}",
            bytes.len(),
            ELEMENT_WIDTH
        )));
    }

    Ok(bytes
        .chunks_exact(ELEMENT_WIDTH)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
