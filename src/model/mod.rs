//! Typed documents and collection names.
//!
//! Field names follow the persisted camelCase schema so documents written
//! by other clients of the same store decode unchanged.

mod notification;
mod project;
mod quotation;
mod reward;
mod user;

pub use notification::{Notification, NotificationKind};
pub use project::{Project, ProjectStatus};
pub use quotation::{
    commission_value, PaymentStatus, ProductRequest, Quotation, QuotationStatus, ANONYMOUS_USER,
};
pub use reward::{Reward, RewardStatus, REFERRAL_REWARD_TYPE};
pub use user::{InstallerStatus, Role, User};

use crate::interfaces::document_store::{Result, StoredDocument};
use serde::de::DeserializeOwned;

/// Collection holding user profiles, keyed by identity user id.
pub const USERS: &str = "users";
/// Collection holding quotations, keyed by order number.
pub const QUOTATIONS: &str = "Quotation_form";
pub const NOTIFICATIONS: &str = "Notification";
pub const REWARDS: &str = "Rewards";
/// Fulfilled orders, read by the admin report.
pub const ORDERS: &str = "orders";
pub const PROJECTS: &str = "projects";

/// A decoded document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub id: String,
    pub doc: T,
}

impl<T: DeserializeOwned> Record<T> {
    pub fn decode(stored: &StoredDocument) -> Result<Self> {
        Ok(Self {
            id: stored.id.clone(),
            doc: stored.decode()?,
        })
    }

    /// Decode a query result, preserving order.
    pub fn decode_all(stored: &[StoredDocument]) -> Result<Vec<Self>> {
        stored.iter().map(Self::decode).collect()
    }
}
