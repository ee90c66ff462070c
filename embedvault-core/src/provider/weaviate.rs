//! Weaviate adapter.
//!
//! A collection maps to a Weaviate class (see [`class_name`]). Each record
//! becomes an object whose UUID is derived from the class and record id, so
//! upserting the same id again overwrites it. The record id and the metadata
//! (as JSON text) are stored as the `item_id` and `metadata_json` properties.
//!
//! Scores are `1 - distance`, which is cosine similarity under Weaviate's
//! default cosine distance.

use std::time::Duration;

use reqwest::header::{HeaderName, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::remote::{degrade, RemoteClient};
use super::simulated::SimulatedAdapter;
use super::{ProviderKind, VectorBackend};
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::vector::{QueryResult, VectorRecord};

const ID_PROPERTY: &str = "item_id";
const METADATA_PROPERTY: &str = "metadata_json";

/// Converts a collection name into a valid Weaviate class name.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, the first letter is upper
/// cased, and names not starting with a letter get a `C` prefix.
pub fn class_name(collection: &str) -> String {
    let mut name: String = collection
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => name[..1].make_ascii_uppercase(),
        _ => name.insert(0, 'C'),
    }
    name
}

/// Deterministic object UUID for a record in a class.
pub fn object_id(class: &str, id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{}/{}", class, id).as_bytes())
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    objects: Vec<BatchObject<'a>>,
}

#[derive(Serialize)]
struct BatchObject<'a> {
    class: &'a str,
    id: Uuid,
    vector: &'a [f32],
    properties: Value,
}

#[derive(Deserialize)]
struct BatchItem {
    #[serde(default)]
    result: Option<BatchResult>,
}

#[derive(Deserialize)]
struct BatchResult {
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Serialize)]
struct GraphQlRequest {
    query: String,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

/// Forwards upserts and queries to a Weaviate instance.
#[derive(Debug, Clone)]
pub struct WeaviateAdapter {
    client: RemoteClient,
}

impl WeaviateAdapter {
    /// Creates an adapter for the instance at `url`. The API key is optional.
    pub fn new(url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let auth: Option<(HeaderName, String)> =
            api_key.map(|key| (AUTHORIZATION, format!("Bearer {}", key)));
        let client = RemoteClient::new(ProviderKind::Weaviate, url, auth, timeout)?;
        Ok(Self { client })
    }

    pub fn url(&self) -> &str {
        self.client.base_url()
    }

    fn send_upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        let class = class_name(collection);
        let mut objects = Vec::with_capacity(records.len());
        for record in records {
            objects.push(BatchObject {
                class: &class,
                id: object_id(&class, &record.id),
                vector: &record.values,
                properties: serde_json::json!({
                    ID_PROPERTY: record.id,
                    METADATA_PROPERTY: record.metadata.to_json()?,
                }),
            });
        }

        let items: Vec<BatchItem> = self
            .client
            .post_json("/v1/batch/objects", &BatchRequest { objects })?;

        let mut written = 0;
        for item in items {
            match item.result.and_then(|r| r.errors) {
                Some(errors) => warn!(%class, %errors, "weaviate rejected object"),
                None => written += 1,
            }
        }
        Ok(written)
    }

    fn send_query(&self, collection: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        let class = class_name(collection);
        let request = GraphQlRequest {
            query: near_vector_query(&class, vector, top_k)?,
        };
        let response: GraphQlResponse = self.client.post_json("/v1/graphql", &request)?;

        if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
            // A class that was never written to is an empty collection.
            if errors.iter().all(|e| is_unknown_class(&e.message, &class)) {
                return Ok(Vec::new());
            }
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::RemoteUnavailable(format!(
                "weaviate query failed: {}",
                messages.join("; ")
            )));
        }

        let hits = response
            .data
            .as_ref()
            .and_then(|data| data.pointer(&format!("/Get/{}", class)))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut results: Vec<QueryResult> = hits.iter().filter_map(parse_hit).collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        Ok(results)
    }
}

fn near_vector_query(class: &str, vector: &[f32], top_k: usize) -> Result<String> {
    let vector = serde_json::to_string(vector)?;
    Ok(format!(
        "{{ Get {{ {class}(nearVector: {{vector: {vector}}}, limit: {top_k}) \
         {{ {ID_PROPERTY} {METADATA_PROPERTY} _additional {{ distance }} }} }} }}"
    ))
}

fn is_unknown_class(message: &str, class: &str) -> bool {
    message.contains("Cannot query field") && message.contains(&format!("\"{}\"", class))
}

fn parse_hit(hit: &Value) -> Option<QueryResult> {
    let id = hit.get(ID_PROPERTY)?.as_str()?;
    let distance = hit.pointer("/_additional/distance")?.as_f64()?;
    let metadata = match hit.get(METADATA_PROPERTY).and_then(Value::as_str) {
        Some(text) => Metadata::from_json(text).unwrap_or_else(|e| {
            debug!(id, error = %e, "unreadable metadata on weaviate object");
            Metadata::new()
        }),
        None => Metadata::new(),
    };
    Some(QueryResult::new(id, 1.0 - distance, metadata))
}

impl VectorBackend for WeaviateAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Weaviate
    }

    fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        Ok(self
            .send_upsert(collection, records)
            .unwrap_or_else(|e| degrade(ProviderKind::Weaviate, "upsert", collection, e, records.len())))
    }

    fn query(&self, collection: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        Ok(self.send_query(collection, vector, top_k).unwrap_or_else(|e| {
            degrade(
                ProviderKind::Weaviate,
                "query",
                collection,
                e,
                SimulatedAdapter::placeholder(top_k),
            )
        }))
    }
}
