//! Compensating writes for multi-document operations.
//!
//! The document store has no cross-document transaction. A `WriteSaga`
//! performs each write of a logical operation through itself, remembering
//! how to undo it. If a later write fails the caller aborts the saga and
//! the recorded compensations run newest-first.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::interfaces::document_store::{Document, DocumentStore, Result};
use crate::interfaces::identity::IdentityProvider;

/// An undo step for one completed write.
#[derive(Debug, Clone, PartialEq)]
pub enum Compensation {
    /// A document was created; delete it.
    DeleteDocument { collection: String, id: String },
    /// A document was patched or overwritten; put back its previous body.
    RestoreDocument {
        collection: String,
        id: String,
        previous: Document,
    },
    /// Values were added to an array field; take them out again.
    RemoveFromArray {
        collection: String,
        id: String,
        field: String,
        values: Vec<Value>,
    },
    /// An identity account was created; remove it.
    DeleteAccount { user_id: String },
}

/// Outcome of aborting a saga.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompensationReport {
    /// Compensations that ran successfully.
    pub undone: usize,
    /// Compensations that failed, as display strings.
    pub failed: Vec<String>,
    /// True when compensation is disabled and writes were left in place.
    pub skipped: bool,
}

impl CompensationReport {
    pub fn is_clean(&self) -> bool {
        !self.skipped && self.failed.is_empty()
    }
}

/// Records writes and undoes them on abort.
pub struct WriteSaga {
    name: &'static str,
    store: Arc<dyn DocumentStore>,
    identity: Option<Arc<dyn IdentityProvider>>,
    compensate: bool,
    undo: Vec<Compensation>,
}

impl WriteSaga {
    pub fn new(name: &'static str, store: Arc<dyn DocumentStore>, compensate: bool) -> Self {
        Self {
            name,
            store,
            identity: None,
            compensate,
            undo: Vec::new(),
        }
    }

    /// Attach the identity provider used to undo account creation.
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Recorded compensations, oldest first.
    pub fn pending(&self) -> &[Compensation] {
        &self.undo
    }

    /// Record an undo step for a write performed outside the saga.
    pub fn record(&mut self, compensation: Compensation) {
        self.undo.push(compensation);
    }

    /// Create a document with a generated id.
    pub async fn create(&mut self, collection: &str, data: Document) -> Result<String> {
        let id = self.store.create(collection, data).await?;
        self.record(Compensation::DeleteDocument {
            collection: collection.to_string(),
            id: id.clone(),
        });
        Ok(id)
    }

    /// Write a document at an explicit id. An overwritten body is put back
    /// on abort; otherwise the document is deleted.
    pub async fn put(&mut self, collection: &str, id: &str, data: Document) -> Result<()> {
        let previous = self.store.get(collection, id).await?.map(|doc| doc.data);
        self.store.put(collection, id, data).await?;
        let compensation = match previous {
            Some(previous) => Compensation::RestoreDocument {
                collection: collection.to_string(),
                id: id.to_string(),
                previous,
            },
            None => Compensation::DeleteDocument {
                collection: collection.to_string(),
                id: id.to_string(),
            },
        };
        self.record(compensation);
        Ok(())
    }

    /// Patch an existing document, remembering its previous body.
    pub async fn update(&mut self, collection: &str, id: &str, patch: Document) -> Result<()> {
        let previous = self.store.get(collection, id).await?.map(|doc| doc.data);
        self.store.update(collection, id, patch).await?;
        if let Some(previous) = previous {
            self.record(Compensation::RestoreDocument {
                collection: collection.to_string(),
                id: id.to_string(),
                previous,
            });
        }
        Ok(())
    }

    /// Union values into an array field. Only values that were actually
    /// added are removed on abort.
    pub async fn array_union(
        &mut self,
        collection: &str,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<()> {
        let existing: Vec<Value> = self
            .store
            .get(collection, id)
            .await?
            .and_then(|doc| doc.data.get(field).and_then(Value::as_array).cloned())
            .unwrap_or_default();
        let added: Vec<Value> = values
            .iter()
            .filter(|v| !existing.contains(v))
            .cloned()
            .collect();

        self.store
            .array_union(collection, id, field, values)
            .await?;
        if !added.is_empty() {
            self.record(Compensation::RemoveFromArray {
                collection: collection.to_string(),
                id: id.to_string(),
                field: field.to_string(),
                values: added,
            });
        }
        Ok(())
    }

    /// Finish successfully; recorded compensations are discarded.
    pub fn commit(self) {
        info!(saga = self.name, writes = self.undo.len(), "Saga committed");
    }

    /// Undo every recorded write, newest first.
    ///
    /// Failures are logged and collected; the remaining compensations still run.
    pub async fn abort(self, cause: &str) -> CompensationReport {
        let mut report = CompensationReport::default();

        if !self.compensate {
            warn!(
                saga = self.name,
                cause,
                writes = self.undo.len(),
                "Compensation disabled, leaving partial writes"
            );
            report.skipped = true;
            return report;
        }

        warn!(saga = self.name, cause, writes = self.undo.len(), "Compensating");

        for step in self.undo.iter().rev() {
            match self.run(step).await {
                Ok(()) => report.undone += 1,
                Err(e) => {
                    error!(saga = self.name, step = ?step, error = %e, "Compensation failed");
                    report.failed.push(e);
                }
            }
        }

        report
    }

    async fn run(&self, step: &Compensation) -> std::result::Result<(), String> {
        match step {
            Compensation::DeleteDocument { collection, id } => self
                .store
                .delete(collection, id)
                .await
                .map_err(|e| e.to_string()),
            Compensation::RestoreDocument {
                collection,
                id,
                previous,
            } => self
                .store
                .put(collection, id, previous.clone())
                .await
                .map_err(|e| e.to_string()),
            Compensation::RemoveFromArray {
                collection,
                id,
                field,
                values,
            } => self
                .store
                .array_remove(collection, id, field, values.clone())
                .await
                .map_err(|e| e.to_string()),
            Compensation::DeleteAccount { user_id } => match &self.identity {
                Some(identity) => identity
                    .delete_account(user_id)
                    .await
                    .map_err(|e| e.to_string()),
                None => Err(format!(
                    "no identity provider to delete account {}",
                    user_id
                )),
            },
        }
    }
}
