//! Test utilities and fixtures.
//!
//! Wires the workflow services over the in-memory store and identity
//! provider so tests can run without a database.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::interfaces::document_store::{to_document, DocumentStore, Query};
use crate::model::{
    Notification, ProductRequest, Quotation, QuotationStatus, Record, Reward, Role, User,
    NOTIFICATIONS, QUOTATIONS, REWARDS, USERS,
};
use crate::identity::InMemoryIdentityProvider;
use crate::storage::MemoryDocumentStore;
use crate::utils::ids::{NumberSource, RandomSource, SequenceSource};
use crate::workflow::{ClientDetails, Measurements, WorkflowContext};

/// In-memory collaborators plus a context built over them.
pub struct TestHarness {
    pub store: Arc<MemoryDocumentStore>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub config: Config,
    pub ctx: WorkflowContext,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::for_test(), Arc::new(RandomSource))
    }

    /// Identifier draws replay `values` in order.
    pub fn with_numbers(values: Vec<u32>) -> Self {
        Self::with_config(Config::for_test(), Arc::new(SequenceSource::new(values)))
    }

    pub fn with_config(config: Config, source: Arc<dyn NumberSource>) -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let identity = Arc::new(InMemoryIdentityProvider::new());
        let ctx = WorkflowContext::with_number_source(
            store.clone(),
            identity.clone(),
            &config,
            source,
        );
        Self {
            store,
            identity,
            config,
            ctx,
        }
    }

    /// Store a user profile without an identity account.
    pub async fn seed_user(&self, uid: &str, name: &str, role: Role, referral_id: &str) -> User {
        let user = User::new(
            uid.to_string(),
            name.to_string(),
            format!("{}@example.com", uid),
            role,
            referral_id.to_string(),
        );
        self.store
            .put(USERS, uid, to_document(&user).unwrap())
            .await
            .unwrap();
        user
    }

    /// Store a pending quotation keyed by its order number.
    pub async fn seed_quotation(&self, order_number: u32, user_id: &str, product: &str) -> Quotation {
        let quotation = Quotation {
            client_name: "Client".to_string(),
            client_phone: "555-0100".to_string(),
            client_email: "client@example.com".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            product: ProductRequest {
                product_name: product.to_string(),
                height: "10".to_string(),
                width: "5".to_string(),
                additional_requirements: String::new(),
                status: QuotationStatus::Pending,
            },
            user_id: user_id.to_string(),
            order_number,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            status: None,
            estimate_price: None,
            commission_percentage: None,
            commission_value: None,
            payment_status: None,
        };
        self.store
            .put(QUOTATIONS, &order_number.to_string(), to_document(&quotation).unwrap())
            .await
            .unwrap();
        quotation
    }

    pub async fn quotation(&self, order_number: u32) -> Option<Quotation> {
        self.store
            .get(QUOTATIONS, &order_number.to_string())
            .await
            .unwrap()
            .map(|d| d.decode().unwrap())
    }

    pub async fn user(&self, uid: &str) -> Option<User> {
        self.store
            .get(USERS, uid)
            .await
            .unwrap()
            .map(|d| d.decode().unwrap())
    }

    pub async fn notifications_for(&self, user_id: &str) -> Vec<Record<Notification>> {
        self.owned_by(NOTIFICATIONS, user_id).await
    }

    pub async fn rewards_for(&self, user_id: &str) -> Vec<Record<Reward>> {
        self.owned_by(REWARDS, user_id).await
    }

    async fn owned_by<T: DeserializeOwned>(&self, collection: &str, user_id: &str) -> Vec<Record<T>> {
        let docs = self
            .store
            .query(&Query::collection(collection).where_eq("userId", user_id))
            .await
            .unwrap();
        Record::decode_all(&docs).unwrap()
    }
}

pub fn client() -> ClientDetails {
    ClientDetails {
        name: "Jane Client".to_string(),
        phone: "555-0199".to_string(),
        email: "jane@example.com".to_string(),
        city: "Springfield".to_string(),
        postal_code: "12345".to_string(),
    }
}

pub fn measurements(height: &str, width: &str) -> Measurements {
    Measurements {
        height: height.to_string(),
        width: width.to_string(),
        additional_requirements: String::new(),
    }
}
