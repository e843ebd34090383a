//! SQLite implementation of the document store.
//!
//! Each document is one row keyed by `(collection, id)` with its body kept
//! as JSON text. Equality predicates are evaluated on the decoded bodies so
//! that matching is identical to the in-memory store.

mod schema;

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Order, Query as SqlQuery, SqliteQueryBuilder};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::interfaces::document_store::{
    union_into, ChangeEvent, ChangeKind, Document, DocumentStore, Query, Result, StoreError,
    StoredDocument,
};

use schema::{Documents, CREATE_DOCUMENTS_TABLE};

/// Change feed capacity.
const CHANNEL_CAPACITY: usize = 1024;

/// SQLite implementation of DocumentStore.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    sender: broadcast::Sender<ChangeEvent>,
}

impl SqliteDocumentStore {
    /// Create a new SQLite document store.
    pub fn new(pool: SqlitePool) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { pool, sender }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_DOCUMENTS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn announce(&self, collection: &str, id: &str, kind: ChangeKind) {
        let _ = self.sender.send(ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        });
    }

    fn decode_body(collection: &str, id: &str, body: &str) -> Result<Document> {
        match serde_json::from_str::<Value>(body)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn upsert_sql(collection: &str, id: &str, data: &Document) -> Result<String> {
        let body = serde_json::to_string(data)?;
        let updated_at = chrono::Utc::now().to_rfc3339();

        Ok(SqlQuery::insert()
            .into_table(Documents::Table)
            .columns([
                Documents::Collection,
                Documents::Id,
                Documents::Body,
                Documents::UpdatedAt,
            ])
            .values_panic([
                collection.into(),
                id.into(),
                body.into(),
                updated_at.into(),
            ])
            .on_conflict(
                OnConflict::columns([Documents::Collection, Documents::Id])
                    .update_columns([Documents::Body, Documents::UpdatedAt])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder))
    }

    fn select_one_sql(collection: &str, id: &str) -> String {
        SqlQuery::select()
            .column(Documents::Body)
            .from(Documents::Table)
            .and_where(Expr::col(Documents::Collection).eq(collection))
            .and_where(Expr::col(Documents::Id).eq(id))
            .to_string(SqliteQueryBuilder)
    }

    /// Read-modify-write a single document inside a transaction.
    async fn modify<F>(&self, collection: &str, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Document) -> Result<()>,
    {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&Self::select_one_sql(collection, id))
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        let body: String = row.get("body");
        let mut doc = Self::decode_body(collection, id, &body)?;

        f(&mut doc)?;

        sqlx::query(&Self::upsert_sql(collection, id, &doc)?)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.announce(collection, id, ChangeKind::Updated);
        Ok(())
    }

    async fn modify_array<F>(&self, collection: &str, id: &str, field: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Value>),
    {
        self.modify(collection, id, |doc| {
            let entry = doc
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if entry.is_null() {
                *entry = Value::Array(Vec::new());
            }
            match entry {
                Value::Array(items) => {
                    f(items);
                    Ok(())
                }
                _ => Err(StoreError::NotAnArray {
                    collection: collection.to_string(),
                    id: id.to_string(),
                    field: field.to_string(),
                }),
            }
        })
        .await
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create(&self, collection: &str, data: Document) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        sqlx::query(&Self::upsert_sql(collection, &id, &data)?)
            .execute(&self.pool)
            .await?;
        debug!(collection, id = %id, "Document created");
        self.announce(collection, &id, ChangeKind::Created);
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &str, data: Document) -> Result<()> {
        let existed = self.get(collection, id).await?.is_some();
        sqlx::query(&Self::upsert_sql(collection, id, &data)?)
            .execute(&self.pool)
            .await?;
        let kind = if existed {
            ChangeKind::Updated
        } else {
            ChangeKind::Created
        };
        self.announce(collection, id, kind);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(&Self::select_one_sql(collection, id))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(StoredDocument {
                    id: id.to_string(),
                    data: Self::decode_body(collection, id, &body)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<()> {
        self.modify(collection, id, |doc| {
            for (key, value) in patch {
                doc.insert(key, value);
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let query = SqlQuery::delete()
            .from_table(Documents::Table)
            .and_where(Expr::col(Documents::Collection).eq(collection))
            .and_where(Expr::col(Documents::Id).eq(id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() > 0 {
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
        let sql = SqlQuery::select()
            .column(Documents::Id)
            .column(Documents::Body)
            .from(Documents::Table)
            .and_where(Expr::col(Documents::Collection).eq(query.collection.as_str()))
            .order_by(Documents::Id, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let body: String = row.get("body");
            let data = Self::decode_body(&query.collection, &id, &body)?;
            if query.matches(&data) {
                documents.push(StoredDocument { id, data });
            }
        }

        Ok(documents)
    }

    fn changes(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        Some(self.sender.subscribe())
    }
}
