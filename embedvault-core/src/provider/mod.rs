//! Backends that can serve the upsert/query contract.
//!
//! - [`LocalEngine`](crate::LocalEngine) answers from the durable store
//! - [`PineconeAdapter`] and [`WeaviateAdapter`] forward to managed services
//! - [`SimulatedAdapter`] accepts everything and returns a placeholder match

pub mod pinecone;
mod remote;
pub mod simulated;
pub mod weaviate;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::{QueryResult, VectorRecord};

pub use pinecone::PineconeAdapter;
pub use simulated::SimulatedAdapter;
pub use weaviate::WeaviateAdapter;

/// Backend identifiers accepted by [`VectorStore::open`](crate::VectorStore::open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Local,
    Pinecone,
    Weaviate,
    Simulated,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Local => "local",
            ProviderKind::Pinecone => "pinecone",
            ProviderKind::Weaviate => "weaviate",
            ProviderKind::Simulated => "simulated",
        }
    }

    /// Returns true for backends that talk to a remote service.
    pub fn is_remote(&self) -> bool {
        matches!(self, ProviderKind::Pinecone | ProviderKind::Weaviate)
    }
}

impl Default for ProviderKind {
    fn default() -> Self {
        Self::Local
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "pinecone" => Ok(Self::Pinecone),
            "weaviate" => Ok(Self::Weaviate),
            "simulated" => Ok(Self::Simulated),
            _ => Err(Error::UnknownProvider(s.to_string())),
        }
    }
}

/// The contract every backend serves.
///
/// Signatures are identical across backends so the facade can forward calls
/// without knowing which one it holds.
pub trait VectorBackend: Send + Sync {
    /// The backend actually serving calls.
    fn kind(&self) -> ProviderKind;

    /// Inserts or replaces `records` in `collection`; returns the count written.
    fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize>;

    /// Returns up to `top_k` matches for `vector`, best first.
    fn query(&self, collection: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert_eq!("local".parse::<ProviderKind>().unwrap(), ProviderKind::Local);
        assert_eq!(" Pinecone ".parse::<ProviderKind>().unwrap(), ProviderKind::Pinecone);
        assert_eq!("WEAVIATE".parse::<ProviderKind>().unwrap(), ProviderKind::Weaviate);
        assert_eq!("simulated".parse::<ProviderKind>().unwrap(), ProviderKind::Simulated);
    }

    #[test]
    fn test_parse_unknown_provider() {
        let result = "milvus".parse::<ProviderKind>();
        assert!(matches!(result, Err(Error::UnknownProvider(name)) if name == "milvus"));
    }

    #[test]
    fn test_display_round_trips() {
        for kind in [
            ProviderKind::Local,
            ProviderKind::Pinecone,
            ProviderKind::Weaviate,
            ProviderKind::Simulated,
        ] {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
        assert!(ProviderKind::Pinecone.is_remote());
        assert!(!ProviderKind::Local.is_remote());
    }
}
