//! Metadata attached to stored vectors.
//!
//! Metadata is an arbitrary JSON object. It is persisted as compact JSON text
//! next to the vector bytes and handed back unchanged with query results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON object carried alongside a vector.
///
/// # Example
///
/// ```
/// use embedvault_core::Metadata;
///
/// let metadata = Metadata::new()
///     .with_field("source", "handbook.pdf")
///     .with_field("page", 12)
///     .with_field("tags", vec!["hr", "policy"]);
///
/// assert_eq!(metadata.get_str("source"), Some("handbook.pdf"));
/// assert_eq!(metadata.get_i64("page"), Some(12));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: Map<String, Value>,
}

impl Metadata {
    /// Creates empty metadata.
    #[inline]
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Wraps an existing JSON object.
    #[inline]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builds metadata from any JSON value.
    ///
    /// Objects are taken as-is, `null` becomes empty metadata, and any other
    /// value is rejected with `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }

    /// Adds a field. Chainable.
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Sets a field value, replacing any previous one.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[inline]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    #[inline]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    #[inline]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    #[inline]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// Removes a field and returns its value if present.
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Encodes the metadata as compact JSON text.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    /// Decodes metadata from JSON text. The text must hold an object.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        let fields: Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self { fields })
    }

    /// Consumes the metadata and returns the JSON object.
    #[inline]
    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

impl From<Metadata> for Value {
    fn from(metadata: Metadata) -> Self {
        Value::Object(metadata.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_with_field() {
        let m = Metadata::new()
            .with_field("name", "test")
            .with_field("count", 42);

        assert_eq!(m.len(), 2);
        assert_eq!(m.get_str("name"), Some("test"));
        assert_eq!(m.get_i64("count"), Some(42));
    }

    #[test]
    fn test_metadata_typed_getters() {
        let m = Metadata::new()
            .with_field("ratio", 0.25)
            .with_field("active", true);

        assert!((m.get_f64("ratio").unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(m.get_bool("active"), Some(true));
        assert_eq!(m.get_str("ratio"), None);
    }

    #[test]
    fn test_metadata_set_and_remove() {
        let mut m = Metadata::new();
        m.set("key", "value");
        assert!(m.contains_key("key"));

        assert_eq!(m.remove("key"), Some(json!("value")));
        assert!(m.is_empty());
    }

    #[test]
    fn test_metadata_json_text_is_object() {
        let m = Metadata::new().with_field("nested", json!({"a": [1, 2]}));
        let text = m.to_json().unwrap();
        assert_eq!(text, r#"{"nested":{"a":[1,2]}}"#);
        assert_eq!(Metadata::from_json(&text).unwrap(), m);
    }

    #[test]
    fn test_metadata_rejects_non_object_json() {
        assert!(Metadata::from_json("[1,2,3]").is_err());
        assert!(Metadata::from_value(json!(3)).is_none());
        assert_eq!(Metadata::from_value(Value::Null), Some(Metadata::new()));
    }
}
