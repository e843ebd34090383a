//! DocumentStore interface tests.
//!
//! These tests verify the contract of the DocumentStore trait.
//! Each storage implementation should run these tests.

use serde_json::{json, Value};

use dealerdesk::interfaces::{to_document, ChangeKind, Document, DocumentStore, Query, StoreError};

/// Build a document body from a JSON literal.
pub fn body(value: Value) -> Document {
    to_document(&value).expect("literal should be an object")
}

// =============================================================================
// create / put / get
// =============================================================================

pub async fn test_create_assigns_ids<S: DocumentStore>(store: &S) {
    let collection = "test_create";
    let a = store
        .create(collection, body(json!({"n": 1})))
        .await
        .expect("create should succeed");
    let b = store
        .create(collection, body(json!({"n": 2})))
        .await
        .expect("create should succeed");
    assert_ne!(a, b, "generated ids should differ");

    let doc = store
        .get(collection, &a)
        .await
        .expect("get should succeed")
        .expect("document should exist");
    assert_eq!(doc.id, a);
    assert_eq!(doc.data["n"], json!(1));
}

pub async fn test_put_replaces_document<S: DocumentStore>(store: &S) {
    let collection = "test_put";
    store
        .put(collection, "100001", body(json!({"a": 1, "b": 2})))
        .await
        .expect("put should succeed");
    store
        .put(collection, "100001", body(json!({"a": 3})))
        .await
        .expect("second put should succeed");

    let doc = store
        .get(collection, "100001")
        .await
        .expect("get should succeed")
        .expect("document should exist");
    assert_eq!(doc.data["a"], json!(3));
    assert!(doc.data.get("b").is_none(), "put should not merge");
}

pub async fn test_get_missing<S: DocumentStore>(store: &S) {
    let found = store
        .get("test_get_missing", "nope")
        .await
        .expect("get should succeed");
    assert!(found.is_none());
}

// =============================================================================
// update / delete
// =============================================================================

pub async fn test_update_merges_fields<S: DocumentStore>(store: &S) {
    let collection = "test_update";
    store
        .put(collection, "q1", body(json!({"status": "Pending", "city": "Oslo"})))
        .await
        .expect("put should succeed");
    store
        .update(collection, "q1", body(json!({"status": "Approved", "estimatePrice": "1000"})))
        .await
        .expect("update should succeed");

    let doc = store
        .get(collection, "q1")
        .await
        .expect("get should succeed")
        .expect("document should exist");
    assert_eq!(doc.data["status"], json!("Approved"));
    assert_eq!(doc.data["city"], json!("Oslo"));
    assert_eq!(doc.data["estimatePrice"], json!("1000"));
}

pub async fn test_update_missing_fails<S: DocumentStore>(store: &S) {
    let err = store
        .update("test_update_missing", "nope", body(json!({"read": true})))
        .await
        .expect_err("update of a missing document should fail");
    assert!(matches!(err, StoreError::NotFound { .. }));
}

pub async fn test_delete_is_idempotent<S: DocumentStore>(store: &S) {
    let collection = "test_delete";
    let id = store
        .create(collection, body(json!({})))
        .await
        .expect("create should succeed");
    store
        .delete(collection, &id)
        .await
        .expect("delete should succeed");
    store
        .delete(collection, &id)
        .await
        .expect("second delete should succeed");
    assert!(store
        .get(collection, &id)
        .await
        .expect("get should succeed")
        .is_none());
}

// =============================================================================
// array operations
// =============================================================================

pub async fn test_array_union_deduplicates<S: DocumentStore>(store: &S) {
    let collection = "test_array_union";
    store
        .put(collection, "u1", body(json!({"name": "Ann"})))
        .await
        .expect("put should succeed");
    store
        .array_union(collection, "u1", "referrals", vec![json!("a"), json!("b")])
        .await
        .expect("union should succeed");
    store
        .array_union(collection, "u1", "referrals", vec![json!("b"), json!("c")])
        .await
        .expect("union should succeed");

    let doc = store
        .get(collection, "u1")
        .await
        .expect("get should succeed")
        .expect("document should exist");
    assert_eq!(doc.data["referrals"], json!(["a", "b", "c"]));
}

pub async fn test_array_remove<S: DocumentStore>(store: &S) {
    let collection = "test_array_remove";
    store
        .put(collection, "u1", body(json!({"referrals": ["a", "b", "c"]})))
        .await
        .expect("put should succeed");
    store
        .array_remove(collection, "u1", "referrals", vec![json!("b"), json!("z")])
        .await
        .expect("remove should succeed");

    let doc = store
        .get(collection, "u1")
        .await
        .expect("get should succeed")
        .expect("document should exist");
    assert_eq!(doc.data["referrals"], json!(["a", "c"]));
}

pub async fn test_array_union_missing_document<S: DocumentStore>(store: &S) {
    let err = store
        .array_union("test_array_missing", "nope", "referrals", vec![json!("a")])
        .await
        .expect_err("union on a missing document should fail");
    assert!(matches!(err, StoreError::NotFound { .. }));
}

// =============================================================================
// queries
// =============================================================================

pub async fn test_query_equality<S: DocumentStore>(store: &S) {
    let collection = "test_query";
    for (user, referral) in [("u1", "ref-1-1"), ("u2", "ref-2-2"), ("u3", "ref-1-1")] {
        store
            .put(collection, user, body(json!({"uid": user, "referralId": referral})))
            .await
            .expect("put should succeed");
    }

    let matching = store
        .query(&Query::collection(collection).where_eq("referralId", "ref-1-1"))
        .await
        .expect("query should succeed");
    let mut ids: Vec<_> = matching.iter().map(|d| d.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["u1", "u3"]);

    let both = store
        .query(
            &Query::collection(collection)
                .where_eq("referralId", "ref-1-1")
                .where_eq("uid", "u3"),
        )
        .await
        .expect("query should succeed");
    assert_eq!(both.len(), 1);

    let none = store
        .query(&Query::collection(collection).where_eq("referralId", "ref-9-9"))
        .await
        .expect("query should succeed");
    assert!(none.is_empty());
}

pub async fn test_query_is_collection_scoped<S: DocumentStore>(store: &S) {
    store
        .put("test_scope_a", "x", body(json!({"k": 1})))
        .await
        .expect("put should succeed");
    let other = store
        .query(&Query::collection("test_scope_b"))
        .await
        .expect("query should succeed");
    assert!(other.is_empty());
}

// =============================================================================
// change feed
// =============================================================================

pub async fn test_change_feed<S: DocumentStore>(store: &S) {
    let Some(mut rx) = store.changes() else {
        return;
    };
    let collection = "test_changes";
    let id = store
        .create(collection, body(json!({})))
        .await
        .expect("create should succeed");
    store
        .update(collection, &id, body(json!({"read": true})))
        .await
        .expect("update should succeed");

    let created = rx.recv().await.expect("should receive created");
    assert_eq!(created.kind, ChangeKind::Created);
    assert_eq!(created.collection, collection);
    let updated = rx.recv().await.expect("should receive updated");
    assert_eq!(updated.kind, ChangeKind::Updated);
    assert_eq!(updated.id, id);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all DocumentStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_document_store_tests {
    ($store:expr) => {
        use $crate::storage::document_store_tests::*;

        test_create_assigns_ids($store).await;
        println!("  test_create_assigns_ids: PASSED");

        test_put_replaces_document($store).await;
        println!("  test_put_replaces_document: PASSED");

        test_get_missing($store).await;
        println!("  test_get_missing: PASSED");

        test_update_merges_fields($store).await;
        println!("  test_update_merges_fields: PASSED");

        test_update_missing_fails($store).await;
        println!("  test_update_missing_fails: PASSED");

        test_delete_is_idempotent($store).await;
        println!("  test_delete_is_idempotent: PASSED");

        test_array_union_deduplicates($store).await;
        println!("  test_array_union_deduplicates: PASSED");

        test_array_remove($store).await;
        println!("  test_array_remove: PASSED");

        test_array_union_missing_document($store).await;
        println!("  test_array_union_missing_document: PASSED");

        test_query_equality($store).await;
        println!("  test_query_equality: PASSED");

        test_query_is_collection_scoped($store).await;
        println!("  test_query_is_collection_scoped: PASSED");

        test_change_feed($store).await;
        println!("  test_change_feed: PASSED");
    };
}
