//! Error types for EmbedVault operations.
//!
//! Absent collections and identities are not errors: scans return an empty
//! vector and point lookups return `None`.

use thiserror::Error;

/// Result type alias using EmbedVault's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during EmbedVault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure while reading or writing the durable store.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored frame failed its checksum or could not be decoded.
    #[error("corrupted record at offset {offset}: {reason}")]
    Corrupted { offset: u64, reason: String },

    /// The store directory was written by an incompatible format version.
    #[error("unsupported store format version {found}, expected {expected}")]
    UnsupportedFormat { expected: u32, found: u32 },

    /// Query and candidate vectors have different lengths.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A vector with zero magnitude (or no elements) cannot be scored.
    #[error("degenerate vector: {0}")]
    DegenerateVector(&'static str),

    /// Metadata or a request body could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The provider identifier does not name a known backend.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider configuration is present but unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// A record cannot be stored as given.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A remote vector service could not serve the request.
    ///
    /// Remote adapters absorb this and fall back to simulated responses; it is
    /// only surfaced by the adapters' raw request helpers.
    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The model version is already present in the registry.
    #[error("model {name} version {version} already registered")]
    AlreadyRegistered { name: String, version: String },

    /// A blocking task on the async runtime failed to complete.
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
