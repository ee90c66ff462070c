//! Stand-in backend used when a remote service is not configured.

use tracing::info;

use super::{ProviderKind, VectorBackend};
use crate::error::Result;
use crate::metadata::Metadata;
use crate::vector::{QueryResult, VectorRecord};

pub const SIMULATED_MATCH_ID: &str = "simulated_match";
pub const SIMULATED_MATCH_SCORE: f64 = 0.95;

/// Accepts every upsert without storing anything and answers every query with
/// one fixed placeholder match. Never touches the network.
#[derive(Debug, Clone)]
pub struct SimulatedAdapter {
    standing_in_for: ProviderKind,
}

impl SimulatedAdapter {
    /// A simulated backend requested directly.
    pub fn new() -> Self {
        Self {
            standing_in_for: ProviderKind::Simulated,
        }
    }

    /// A simulated backend replacing an unconfigured `provider`.
    pub fn standing_in_for(provider: ProviderKind) -> Self {
        Self {
            standing_in_for: provider,
        }
    }

    /// The provider whose place this backend takes.
    pub fn stands_in_for(&self) -> ProviderKind {
        self.standing_in_for
    }

    /// The placeholder returned for queries.
    pub fn placeholder(top_k: usize) -> Vec<QueryResult> {
        if top_k == 0 {
            return Vec::new();
        }
        vec![QueryResult::new(
            SIMULATED_MATCH_ID,
            SIMULATED_MATCH_SCORE,
            Metadata::new().with_field("text", "Simulated result"),
        )]
    }
}

impl Default for SimulatedAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorBackend for SimulatedAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Simulated
    }

    fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        info!(
            provider = %self.standing_in_for,
            collection,
            count = records.len(),
            "simulated upsert"
        );
        Ok(records.len())
    }

    fn query(&self, collection: &str, _vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        info!(provider = %self.standing_in_for, collection, top_k, "simulated query");
        Ok(Self::placeholder(top_k))
    }
}
