//! Document storage interface.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

/// A schemaless document body.
pub type Document = Map<String, Value>;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: collection={collection}, id={id}")]
    NotFound { collection: String, id: String },

    #[error("Document is not a JSON object: collection={collection}, id={id}")]
    NotAnObject { collection: String, id: String },

    #[error("Field '{field}' is not an array: collection={collection}, id={id}")]
    NotAnArray {
        collection: String,
        id: String,
        field: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Equality predicate over a top-level or dotted document field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Check whether a document satisfies this predicate.
    ///
    /// Dotted fields (`product.productName`) descend into nested objects.
    /// A missing field never matches.
    pub fn matches(&self, doc: &Document) -> bool {
        let mut parts = self.field.split('.');
        let Some(first) = parts.next() else {
            return false;
        };
        let mut current = match doc.get(first) {
            Some(v) => v,
            None => return false,
        };
        for part in parts {
            current = match current.get(part) {
                Some(v) => v,
                None => return false,
            };
        }
        *current == self.value
    }
}

/// Conjunction of equality predicates over a single collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
}

impl Query {
    /// Query every document in a collection.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
        }
    }

    /// Add an equality predicate.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(field, value));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }
}

/// A document together with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

impl StoredDocument {
    /// Decode the body into a typed document.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        from_document(self.data.clone())
    }
}

/// Kind of mutation announced on the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A mutation announced on the change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
}

/// Interface for document persistence.
///
/// Documents live in named collections and are addressed by a string id.
/// Writes are single-document; nothing here spans documents atomically.
///
/// Implementations:
/// - `MemoryDocumentStore`: in-process, for standalone use and tests
/// - `SqliteDocumentStore`: JSON documents in SQLite
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a store-generated id and return that id.
    async fn create(&self, collection: &str, data: Document) -> Result<String>;

    /// Create or overwrite the document at an explicit id.
    async fn put(&self, collection: &str, id: &str, data: Document) -> Result<()>;

    /// Read a document by id.
    ///
    /// Returns `None` if no such document exists.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>>;

    /// Merge `patch` into an existing document (top-level keys replace).
    ///
    /// Fails with `NotFound` if the document does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<()>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Append values to an array field, skipping values already present.
    ///
    /// A missing field is treated as an empty array.
    async fn array_union(&self, collection: &str, id: &str, field: &str, values: Vec<Value>)
        -> Result<()>;

    /// Remove every occurrence of the given values from an array field.
    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<()>;

    /// Return a snapshot of all documents matching the query.
    async fn query(&self, query: &Query) -> Result<Vec<StoredDocument>>;

    /// Subscribe to mutations, if the backend can announce them.
    ///
    /// Backends without a change feed return `None`; watchers fall back to polling.
    fn changes(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        None
    }
}

/// Encode a typed value as a document body.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(serde::ser::Error::custom(format!(
            "expected a JSON object, got {}",
            other
        )))),
    }
}

/// Decode a document body into a typed value.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Merge an array-union into an existing value, preserving insertion order.
pub(crate) fn union_into(existing: &mut Vec<Value>, values: Vec<Value>) {
    for value in values {
        if !existing.contains(&value) {
            existing.push(value);
        }
    }
}
