//! In-memory document store.
//!
//! Keeps every collection in a `HashMap` behind a tokio `RwLock` and
//! announces mutations on a broadcast channel. Used by the standalone
//! profile and throughout the tests, which can also inject failures.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::interfaces::document_store::{
    union_into, ChangeEvent, ChangeKind, Document, DocumentStore, Query, Result, StoreError,
    StoredDocument,
};

/// Change feed capacity.
const CHANNEL_CAPACITY: usize = 1024;

/// In-memory document store.
pub struct MemoryDocumentStore {
    /// collection -> (id -> body). `BTreeMap` keeps query output stable.
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    sender: broadcast::Sender<ChangeEvent>,
    fail_writes: RwLock<HashSet<String>>,
    unavailable: RwLock<bool>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            collections: RwLock::new(HashMap::new()),
            sender,
            fail_writes: RwLock::new(HashSet::new()),
            unavailable: RwLock::new(false),
        }
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `collection` fail until cleared.
    pub async fn set_fail_writes(&self, collection: &str, fail: bool) {
        let mut failing = self.fail_writes.write().await;
        if fail {
            failing.insert(collection.to_string());
        } else {
            failing.remove(collection);
        }
    }

    /// Make every operation fail until cleared.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Number of documents currently held in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    async fn check_read(&self) -> Result<()> {
        if *self.unavailable.read().await {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    async fn check_write(&self, collection: &str) -> Result<()> {
        self.check_read().await?;
        if self.fail_writes.read().await.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "writes to '{}' are failing",
                collection
            )));
        }
        Ok(())
    }

    fn announce(&self, collection: &str, id: &str, kind: ChangeKind) {
        // No receivers is fine.
        let _ = self.sender.send(ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        });
    }

    async fn modify_array<F>(&self, collection: &str, id: &str, field: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Value>),
    {
        self.check_write(collection).await?;
        {
            let mut store = self.collections.write().await;
            let doc = store
                .get_mut(collection)
                .and_then(|c| c.get_mut(id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            let entry = doc
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if entry.is_null() {
                *entry = Value::Array(Vec::new());
            }
            match entry {
                Value::Array(items) => f(items),
                _ => {
                    return Err(StoreError::NotAnArray {
                        collection: collection.to_string(),
                        id: id.to_string(),
                        field: field.to_string(),
                    })
                }
            }
        }
        self.announce(collection, id, ChangeKind::Updated);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, data: Document) -> Result<String> {
        self.check_write(collection).await?;
        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        debug!(collection, id = %id, "Document created");
        self.announce(collection, &id, ChangeKind::Created);
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, data: Document) -> Result<()> {
        self.check_write(collection).await?;
        let previous = self
            .collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        let kind = if previous.is_some() {
            ChangeKind::Updated
        } else {
            ChangeKind::Created
        };
        self.announce(collection, id, kind);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        self.check_read().await?;
        let store = self.collections.read().await;
        Ok(store
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|data| StoredDocument {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<()> {
        self.check_write(collection).await?;
        {
            let mut store = self.collections.write().await;
            let doc = store
                .get_mut(collection)
                .and_then(|c| c.get_mut(id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            for (key, value) in patch {
                doc.insert(key, value);
            }
        }
        self.announce(collection, id, ChangeKind::Updated);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.check_write(collection).await?;
        let removed = self
            .collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|c| c.remove(id));
        if removed.is_some() {
            self.announce(collection, id, ChangeKind::Deleted);
        }
        Ok(())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<()> {
        self.modify_array(collection, id, field, |items| union_into(items, values))
            .await
    }

    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<()> {
        self.modify_array(collection, id, field, |items| {
            items.retain(|item| !values.contains(item))
        })
        .await
    }

    async fn query(&self, query: &Query) -> Result<Vec<StoredDocument>> {
        self.check_read().await?;
        let store = self.collections.read().await;
        Ok(store
            .get(&query.collection)
            .map(|c| {
                c.iter()
                    .filter(|(_, data)| query.matches(data))
                    .map(|(id, data)| StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn changes(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        Some(self.sender.subscribe())
    }
}
