//! Shared storage integration tests.
//!
//! Tests the DocumentStore interface against all implementations.
//! Each implementation module imports these test functions and runs them.

pub mod document_store_tests;
