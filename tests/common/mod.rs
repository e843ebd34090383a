//! Shared fixtures for workflow integration tests.
//!
//! Wires the workflow services over the in-memory store and identity
//! provider, with deterministic identifier draws when asked.

#![allow(dead_code)]

use std::sync::Arc;

use dealerdesk::config::Config;
use dealerdesk::identity::InMemoryIdentityProvider;
use dealerdesk::interfaces::{DocumentStore, Query};
use dealerdesk::model::{Role, NOTIFICATIONS};
use dealerdesk::session::Session;
use dealerdesk::storage::MemoryDocumentStore;
use dealerdesk::utils::ids::{NumberSource, RandomSource, SequenceSource};
use dealerdesk::workflow::{
    AccountService, ClientDetails, Measurements, NotificationFeed, QuotationService,
    ReviewService, SignupRequest, WorkflowContext,
};

pub const PASSWORD: &str = "secret1";

pub struct App {
    pub store: Arc<MemoryDocumentStore>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub accounts: AccountService,
    pub quotations: QuotationService,
    pub review: ReviewService,
    pub feed: NotificationFeed,
}

impl App {
    pub fn new() -> Self {
        Self::build(Config::for_test(), Arc::new(RandomSource))
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, Arc::new(RandomSource))
    }

    pub fn with_numbers(config: Config, values: Vec<u32>) -> Self {
        Self::build(config, Arc::new(SequenceSource::new(values)))
    }

    fn build(config: Config, source: Arc<dyn NumberSource>) -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let identity = Arc::new(InMemoryIdentityProvider::new());
        let ctx = WorkflowContext::with_number_source(store.clone(), identity.clone(), &config, source);
        Self {
            store,
            identity,
            accounts: AccountService::new(ctx.clone()),
            quotations: QuotationService::new(ctx.clone()),
            review: ReviewService::new(ctx.clone()),
            feed: NotificationFeed::new(ctx),
        }
    }

    pub async fn notification_count(&self, user_id: &str) -> usize {
        self.store
            .query(&Query::collection(NOTIFICATIONS).where_eq("userId", user_id))
            .await
            .expect("query should succeed")
            .len()
    }
}

pub fn signup_request(name: &str, role: Role) -> SignupRequest {
    SignupRequest {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: PASSWORD.to_string(),
        role,
    }
}

pub fn admin() -> Session {
    Session::new("admin-1", "admin@example.com", Role::Admin)
}

pub fn dealer(uid: &str) -> Session {
    Session::new(uid, format!("{}@example.com", uid), Role::Dealer)
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
