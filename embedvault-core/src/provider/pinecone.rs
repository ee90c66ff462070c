//! Pinecone data-plane adapter.
//!
//! A collection maps to a namespace inside the index served at the configured
//! index host. Records are sent in batches of [`UPSERT_BATCH`].

use std::time::Duration;

use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};

use super::remote::{degrade, RemoteClient};
use super::simulated::SimulatedAdapter;
use super::{ProviderKind, VectorBackend};
use crate::error::Result;
use crate::metadata::Metadata;
use crate::vector::{QueryResult, VectorRecord};

/// Vectors per upsert request.
pub const UPSERT_BATCH: usize = 100;

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    namespace: &'a str,
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    #[serde(skip_serializing_if = "no_metadata")]
    metadata: &'a Metadata,
}

fn no_metadata(metadata: &&Metadata) -> bool {
    metadata.is_empty()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    metadata: Option<Metadata>,
}

/// Forwards upserts and queries to a Pinecone index.
#[derive(Debug, Clone)]
pub struct PineconeAdapter {
    client: RemoteClient,
}

impl PineconeAdapter {
    /// Creates an adapter for the index served at `index_host`.
    pub fn new(api_key: &str, index_host: &str, timeout: Duration) -> Result<Self> {
        let client = RemoteClient::new(
            ProviderKind::Pinecone,
            index_host,
            Some((HeaderName::from_static("api-key"), api_key.to_string())),
            timeout,
        )?;
        Ok(Self { client })
    }

    /// The normalized index host.
    pub fn index_host(&self) -> &str {
        self.client.base_url()
    }

    fn send_upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<usize> {
        let mut written = 0;
        for batch in records.chunks(UPSERT_BATCH) {
            let request = UpsertRequest {
                vectors: batch
                    .iter()
                    .map(|r| PineconeVector {
                        id: &r.id,
                        values: &r.values,
                        metadata: &r.metadata,
                    })
                    .collect(),
                namespace,
            };
            let response: UpsertResponse = self.client.post_json("/vectors/upsert", &request)?;
            written += response.upserted_count;
        }
        Ok(written)
    }

    fn send_query(&self, namespace: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        let request = QueryRequest {
            namespace,
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };
        let response: QueryResponse = self.client.post_json("/query", &request)?;

        let mut results: Vec<QueryResult> = response
            .matches
            .into_iter()
            .map(|m| QueryResult::new(m.id, m.score, m.metadata.unwrap_or_default()))
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        Ok(results)
    }
}

impl VectorBackend for PineconeAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Pinecone
    }

    fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        Ok(self
            .send_upsert(collection, records)
            .unwrap_or_else(|e| degrade(ProviderKind::Pinecone, "upsert", collection, e, records.len())))
    }

    fn query(&self, collection: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        Ok(self.send_query(collection, vector, top_k).unwrap_or_else(|e| {
            degrade(
                ProviderKind::Pinecone,
                "query",
                collection,
                e,
                SimulatedAdapter::placeholder(top_k),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upsert_request_shape() {
        let records = vec![
            VectorRecord::new("a", vec![1.0, 0.5])
                .with_metadata(Metadata::new().with_field("genre", "drama")),
            VectorRecord::new("b", vec![0.0, 1.0]),
        ];
        let request = UpsertRequest {
            vectors: records
                .iter()
                .map(|r| PineconeVector {
                    id: &r.id,
                    values: &r.values,
                    metadata: &r.metadata,
                })
                .collect(),
            namespace: "films",
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "vectors": [
                    {"id": "a", "values": [1.0, 0.5], "metadata": {"genre": "drama"}},
                    {"id": "b", "values": [0.0, 1.0]}
                ],
                "namespace": "films"
            })
        );
    }

    #[test]
    fn test_query_request_shape() {
        let request = QueryRequest {
            namespace: "films",
            vector: &[0.25],
            top_k: 3,
            include_metadata: true,
            include_values: false,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "namespace": "films",
                "vector": [0.25],
                "topK": 3,
                "includeMetadata": true,
                "includeValues": false
            })
        );
    }

    #[test]
    fn test_query_response_parses_sparse_matches() {
        let response: QueryResponse = serde_json::from_value(json!({
            "matches": [
                {"id": "a", "score": 0.9, "metadata": {"genre": "drama"}},
                {"id": "b", "score": 0.4}
            ],
            "namespace": "films"
        }))
        .unwrap();

        assert_eq!(response.matches.len(), 2);
        assert_eq!(response.matches[0].metadata.as_ref().unwrap().get_str("genre"), Some("drama"));
        assert!(response.matches[1].metadata.is_none());
    }

    #[test]
    fn test_unreachable_host_degrades() {
        // Nothing listens on the discard port.
        let adapter = PineconeAdapter::new("key", "http://127.0.0.1:9", Duration::from_millis(500)).unwrap();

        let written = adapter
            .upsert("films", &[VectorRecord::new("a", vec![1.0])])
            .unwrap();
        assert_eq!(written, 1);

        let results = adapter.query("films", &[1.0], 4).unwrap();
        assert_eq!(results, SimulatedAdapter::placeholder(4));
    }
}
