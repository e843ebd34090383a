//! Abstract interfaces for external collaborators.
//!
//! These traits define the contracts for:
//! - Document storage (collection-scoped CRUD, equality queries, change feed)
//! - Identity (account creation, sign-in, sessions)

pub mod document_store;
pub mod identity;

pub use document_store::{
    from_document, to_document, ChangeEvent, ChangeKind, Document, DocumentStore, Filter, Query,
    StoreError, StoredDocument,
};
pub use identity::{AuthError, AuthSession, IdentityProvider};
