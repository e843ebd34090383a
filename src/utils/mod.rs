//! Shared utilities.
//!
//! Identifier generation, pagination, retry, compensating writes and
//! binary bootstrap helpers used across the workflow modules.

pub mod bootstrap;
pub mod ids;
pub mod page;
pub mod retry;
pub mod saga;
