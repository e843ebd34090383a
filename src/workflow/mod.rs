//! Quotation, referral and notification workflows.
//!
//! Every service shares a `WorkflowContext` holding the store, the identity
//! provider and id generation. Writes that span several documents go
//! through a `WriteSaga` so a failure part-way can be undone.

pub mod accounts;
pub mod dashboard;
pub mod error;
pub mod notifications;
pub mod review;
pub mod rewards;
pub mod submission;

use std::sync::Arc;

use crate::config::{Config, WorkflowConfig};
use crate::interfaces::document_store::{to_document, DocumentStore};
use crate::interfaces::identity::IdentityProvider;
use crate::model::{Notification, Record, User, NOTIFICATIONS, USERS};
use crate::utils::ids::{IdGenerator, NumberSource, RandomSource};
use crate::utils::saga::WriteSaga;

pub use accounts::{AccountService, LoginRequest, ReferralCodeField, ReferrerDetails, SignupRequest};
pub use dashboard::{
    AdminOverview, DashboardService, DealerSummary, InstallerSummary, OrdersReport,
    ProjectStatusCounts,
};
pub use error::{Result, ValidationError, WorkflowError};
pub use notifications::{DayGroup, NotificationFeed, NotificationQuery, NotificationView};
pub use review::{
    ApprovalInput, QuotationBoard, QuotationFilter, QuotationStats, ReviewService,
};
pub use rewards::{ReferralOverview, RewardQuery, RewardService, RewardSort};
pub use submission::{Cart, ClientDetails, Measurements, QuotationService, Submission};

/// Collaborators and settings shared by every workflow service.
#[derive(Clone)]
pub struct WorkflowContext {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub ids: IdGenerator,
    pub settings: WorkflowConfig,
    /// Undo earlier writes when a later one fails.
    pub compensate: bool,
}

impl WorkflowContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: &Config,
    ) -> Self {
        Self::with_number_source(store, identity, config, Arc::new(RandomSource))
    }

    /// Build a context drawing identifiers from `source`.
    pub fn with_number_source(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: &Config,
        source: Arc<dyn NumberSource>,
    ) -> Self {
        let ids = IdGenerator::new(
            source,
            store.clone(),
            config.workflow.enforce_unique_ids,
            config.workflow.id_attempts,
        );
        Self {
            store,
            identity,
            ids,
            settings: config.workflow.clone(),
            compensate: config.saga.compensate,
        }
    }

    pub(crate) fn saga(&self, name: &'static str) -> WriteSaga {
        WriteSaga::new(name, self.store.clone(), self.compensate)
            .with_identity(self.identity.clone())
    }

    pub(crate) async fn load_user(&self, user_id: &str) -> Result<Option<Record<User>>> {
        match self.store.get(USERS, user_id).await? {
            Some(stored) => Ok(Some(Record::decode(&stored)?)),
            None => Ok(None),
        }
    }
}

/// Write a notification as part of a saga and return its id.
pub(crate) async fn notify(saga: &mut WriteSaga, notification: &Notification) -> Result<String> {
    Ok(saga
        .create(NOTIFICATIONS, to_document(notification)?)
        .await?)
}
