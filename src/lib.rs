//! DealerDesk - dealer and installer dashboard workflows
//!
//! Quotation submission and admin review, referral-linked signup with
//! reward issuance, and per-user notification feeds, over an abstract
//! document store and identity provider.

pub mod access;
pub mod catalog;
pub mod config;
pub mod identity;
pub mod interfaces;
pub mod model;
pub mod session;
pub mod storage;
pub mod utils;
pub mod watch;
pub mod workflow;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
