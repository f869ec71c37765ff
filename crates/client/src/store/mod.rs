//! Document database boundary.
//!
//! Records live as JSON objects in named collections, keyed by string ids.
//! Writes are expressed as [`Fields`], which may contain the
//! [`FieldValue::ServerTimestamp`] sentinel; the store replaces it with its
//! own clock at write time, formatted as RFC 3339 with microseconds
//! (`2025-09-01T12:00:00.000000Z`) so timestamps sort lexically.
//!
//! # Implementations
//!
//! - [`PgDocumentStore`] - `PostgreSQL` JSONB table (`documents`)
//! - [`MemoryDocumentStore`] - in-process maps, for development and tests

mod memory;
mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::{PgDocumentStore, create_pool};

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Document not found.
    #[error("Not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data does not have the expected shape.
    #[error("Data corruption: {0}")]
    DataCorruption(String),

    /// The store is not reachable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A value to write into one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    /// Replaced by the store's clock at write time.
    ServerTimestamp,
}

/// A set of field writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a serialized JSON object.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if `value` does not serialize to a
    /// JSON object.
    pub fn from_serialize(value: &impl serde::Serialize) -> Result<Self, StoreError> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::Value(v)))
                    .collect(),
            )),
            other => Err(StoreError::DataCorruption(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Set a field to a plain value.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), FieldValue::Value(value.into()));
        self
    }

    /// Set a field to the server timestamp.
    #[must_use]
    pub fn server_timestamp(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), FieldValue::ServerTimestamp);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Replace every server-timestamp sentinel with `now`.
    #[must_use]
    pub fn resolve(self, now: &str) -> Map<String, Value> {
        self.0
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    FieldValue::Value(v) => v,
                    FieldValue::ServerTimestamp => Value::String(now.to_owned()),
                };
                (key, value)
            })
            .collect()
    }
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    /// Decode into `T`, exposing the document id as an `id` field.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the data does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut data = self.data.clone();
        data.insert("id".to_owned(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(data))?)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Sort direction for [`DocumentStore::list_ordered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A collection-oriented document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document under a generated id and return the id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Create or merge into the document at `id`.
    ///
    /// Fields not named in `fields` are left untouched.
    async fn set_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    /// Partially update an existing document.
    ///
    /// Returns `StoreError::NotFound` if there is no document at `id`.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Delete the document at `id`. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Every document that has `field`, ordered by it.
    async fn list_ordered(
        &self,
        collection: &str,
        field: &str,
        direction: Direction,
    ) -> Result<Vec<Document>, StoreError>;
}

/// Format a timestamp the way stores write server timestamps.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resolve_replaces_sentinels() {
        let fields = Fields::new()
            .set("title", "Broken map")
            .server_timestamp("createdAt")
            .server_timestamp("updatedAt");
        let map = fields.resolve("2025-09-01T12:00:00.000000Z");
        assert_eq!(map["title"], "Broken map");
        assert_eq!(map["createdAt"], map["updatedAt"]);
    }

    #[test]
    fn test_from_serialize_requires_object() {
        assert!(Fields::from_serialize(&json!({"a": 1})).is_ok());
        assert!(Fields::from_serialize(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_decode_injects_id() {
        #[derive(serde::Deserialize)]
        struct Row {
            id: String,
            name: String,
        }

        let doc = Document {
            id: "d1".to_owned(),
            data: json!({"name": "x"}).as_object().unwrap().clone(),
        };
        let row: Row = doc.decode().unwrap();
        assert_eq!(row.id, "d1");
        assert_eq!(row.name, "x");
    }

    #[test]
    fn test_timestamp_format_has_micros() {
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2025-09-01T12:00:00.000000Z");
    }
}
