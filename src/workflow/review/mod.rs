//! Admin review of quotations.
//!
//! A quotation starts Pending and moves once, to Approved or Rejected.
//! Approval records the estimate, the commission and the payment status;
//! both decisions notify the quotation's owner.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::interfaces::document_store::{to_document, Query};
use crate::model::{
    commission_value, Notification, NotificationKind, PaymentStatus, Quotation, QuotationStatus,
    Record, Role, QUOTATIONS,
};
use crate::session::Session;
use crate::utils::page::Page;
use crate::workflow::error::{Result, ValidationError, WorkflowError};
use crate::workflow::{notify, WorkflowContext};

/// Values entered by the admin when approving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalInput {
    pub estimate_price: Option<Decimal>,
    pub commission_percentage: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
}

impl ApprovalInput {
    /// Estimate and percentage with the default Pending payment status.
    pub fn new(estimate_price: Decimal, commission_percentage: Decimal) -> Self {
        Self {
            estimate_price: Some(estimate_price),
            commission_percentage: Some(commission_percentage),
            payment_status: Some(PaymentStatus::Pending),
        }
    }

    pub fn with_payment_status(mut self, payment_status: PaymentStatus) -> Self {
        self.payment_status = Some(payment_status);
        self
    }

    fn complete(&self) -> std::result::Result<(Decimal, Decimal, PaymentStatus), ValidationError> {
        match (
            self.estimate_price,
            self.commission_percentage,
            self.payment_status,
        ) {
            (Some(estimate), Some(percentage), Some(payment)) => Ok((estimate, percentage, payment)),
            _ => Err(ValidationError::IncompleteApproval),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalPatch {
    status: QuotationStatus,
    #[serde(with = "rust_decimal::serde::float")]
    estimate_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    commission_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    commission_value: Decimal,
    payment_status: PaymentStatus,
}

#[derive(Serialize)]
struct RejectionPatch {
    status: QuotationStatus,
}

/// Independent filters over the fetched quotation list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotationFilter {
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<QuotationStatus>,
    /// Case-insensitive substring of the order number. Empty = any.
    pub order_number: String,
}

impl QuotationFilter {
    pub fn matches(&self, quotation: &Quotation) -> bool {
        if let Some(payment) = self.payment_status {
            if quotation.payment_status() != payment {
                return false;
            }
        }
        if let Some(status) = self.status {
            if quotation.status() != status {
                return false;
            }
        }
        let needle = self.order_number.to_lowercase();
        needle.is_empty() || quotation.order_number.to_string().contains(&needle)
    }
}

/// Counts shown on the admin overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotationStats {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
}

impl QuotationStats {
    pub fn from_quotations<'a>(quotations: impl IntoIterator<Item = &'a Quotation>) -> Self {
        let mut stats = Self::default();
        for quotation in quotations {
            stats.total += 1;
            match quotation.status() {
                QuotationStatus::Pending => stats.pending += 1,
                QuotationStatus::Approved => stats.approved += 1,
                QuotationStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }
}

/// Admin decisions over stored quotations.
#[derive(Clone)]
pub struct ReviewService {
    ctx: WorkflowContext,
}

impl ReviewService {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx }
    }

    /// Every quotation, ordered by id.
    pub async fn list(&self, session: &Session) -> Result<Vec<Record<Quotation>>> {
        session.require_role(Role::Admin)?;
        let docs = self.ctx.store.query(&Query::collection(QUOTATIONS)).await?;
        Ok(Record::decode_all(&docs)?)
    }

    pub async fn get(&self, session: &Session, id: &str) -> Result<Record<Quotation>> {
        session.require_role(Role::Admin)?;
        self.load(id).await
    }

    pub async fn stats(&self, session: &Session) -> Result<QuotationStats> {
        let all = self.list(session).await?;
        Ok(QuotationStats::from_quotations(all.iter().map(|r| &r.doc)))
    }

    /// Approve a pending quotation and notify its owner.
    ///
    /// Missing inputs, or a commission too large to represent, fail
    /// validation before anything is read or written.
    /// A quotation that is already decided is left untouched.
    #[tracing::instrument(skip_all, fields(quotation_id = %id))]
    pub async fn approve(
        &self,
        session: &Session,
        id: &str,
        input: &ApprovalInput,
    ) -> Result<Quotation> {
        session.require_role(Role::Admin)?;
        let (estimate_price, commission_percentage, payment_status) = input.complete()?;
        let commission = commission_value(estimate_price, commission_percentage).ok_or(
            ValidationError::AmountOutOfRange {
                estimate: estimate_price,
                percentage: commission_percentage,
            },
        )?;

        let record = self.load_pending(id).await?;
        let patch = ApprovalPatch {
            status: QuotationStatus::Approved,
            estimate_price,
            commission_percentage,
            commission_value: commission,
            payment_status,
        };

        let mut quotation = record.doc;
        let notification = Notification::new(
            quotation.user_id.clone(),
            format!(
                "Your Quotation #{} for {} has been approved.",
                quotation.order_number,
                product_label(&quotation)
            ),
            NotificationKind::Alert,
        )
        .for_order(quotation.order_number);

        self.decide(id, to_document(&patch)?, &notification).await?;

        quotation.status = Some(QuotationStatus::Approved);
        quotation.estimate_price = Some(estimate_price);
        quotation.commission_percentage = Some(commission_percentage);
        quotation.commission_value = Some(commission);
        quotation.payment_status = Some(payment_status);
        info!(order_number = quotation.order_number, commission = %commission, "Quotation approved");
        Ok(quotation)
    }

    /// Reject a pending quotation and notify its owner.
    #[tracing::instrument(skip_all, fields(quotation_id = %id))]
    pub async fn reject(&self, session: &Session, id: &str) -> Result<Quotation> {
        session.require_role(Role::Admin)?;
        let record = self.load_pending(id).await?;

        let mut quotation = record.doc;
        let notification = Notification::new(
            quotation.user_id.clone(),
            format!(
                "Your Quotation #{} for {} has been Rejected. Please review and resubmit.",
                quotation.order_number,
                product_label(&quotation)
            ),
            NotificationKind::Alert,
        )
        .for_order(quotation.order_number);

        let patch = RejectionPatch {
            status: QuotationStatus::Rejected,
        };
        self.decide(id, to_document(&patch)?, &notification).await?;

        quotation.status = Some(QuotationStatus::Rejected);
        info!(order_number = quotation.order_number, "Quotation rejected");
        Ok(quotation)
    }

    async fn decide(
        &self,
        id: &str,
        patch: crate::interfaces::document_store::Document,
        notification: &Notification,
    ) -> Result<()> {
        let mut saga = self.ctx.saga("review_quotation");
        let written: Result<String> = async {
            saga.update(QUOTATIONS, id, patch).await?;
            notify(&mut saga, notification).await
        }
        .await;

        match written {
            Ok(_) => {
                saga.commit();
                Ok(())
            }
            Err(e) => {
                error!(quotation_id = %id, error = %e, "Review decision failed");
                saga.abort(&e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn load(&self, id: &str) -> Result<Record<Quotation>> {
        let stored = self
            .ctx
            .store
            .get(QUOTATIONS, id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound {
                collection: QUOTATIONS,
                id: id.to_string(),
            })?;
        Ok(Record::decode(&stored)?)
    }

    async fn load_pending(&self, id: &str) -> Result<Record<Quotation>> {
        let record = self.load(id).await?;
        let status = record.doc.status();
        if status.is_terminal() {
            warn!(quotation_id = %id, %status, "Quotation already decided");
            return Err(WorkflowError::AlreadyDecided {
                id: id.to_string(),
                status,
            });
        }
        Ok(record)
    }
}

fn product_label(quotation: &Quotation) -> &str {
    if quotation.product.product_name.is_empty() {
        "Unknown Product"
    } else {
        &quotation.product.product_name
    }
}

/// The admin's quotation list: filters, paging and an in-memory mirror of
/// decisions made through it.
#[derive(Debug, Clone)]
pub struct QuotationBoard {
    all: Vec<Record<Quotation>>,
    filter: QuotationFilter,
    page: usize,
    page_size: usize,
}

impl QuotationBoard {
    pub fn new(all: Vec<Record<Quotation>>, page_size: usize) -> Self {
        Self {
            all,
            filter: QuotationFilter::default(),
            page: 1,
            page_size,
        }
    }

    /// Fetch every quotation once.
    pub async fn load(service: &ReviewService, session: &Session) -> Result<Self> {
        let all = service.list(session).await?;
        Ok(Self::new(all, service.ctx.settings.quotation_page_size))
    }

    pub fn filter(&self) -> &QuotationFilter {
        &self.filter
    }

    /// Replace the filter and go back to the first page.
    pub fn set_filter(&mut self, filter: QuotationFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    pub fn get(&self, id: &str) -> Option<&Record<Quotation>> {
        self.all.iter().find(|r| r.id == id)
    }

    pub fn filtered(&self) -> Vec<&Record<Quotation>> {
        self.all
            .iter()
            .filter(|r| self.filter.matches(&r.doc))
            .collect()
    }

    pub fn visible(&self) -> Page<&Record<Quotation>> {
        Page::slice(self.filtered(), self.page, self.page_size)
    }

    pub fn stats(&self) -> QuotationStats {
        QuotationStats::from_quotations(self.all.iter().map(|r| &r.doc))
    }

    /// Approve through `service` and mirror the result locally without re-reading.
    pub async fn approve(
        &mut self,
        service: &ReviewService,
        session: &Session,
        id: &str,
        input: &ApprovalInput,
    ) -> Result<()> {
        let updated = service.approve(session, id, input).await?;
        self.mirror(id, updated);
        Ok(())
    }

    pub async fn reject(&mut self, service: &ReviewService, session: &Session, id: &str) -> Result<()> {
        let updated = service.reject(session, id).await?;
        self.mirror(id, updated);
        Ok(())
    }

    fn mirror(&mut self, id: &str, updated: Quotation) {
        if let Some(record) = self.all.iter_mut().find(|r| r.id == id) {
            record.doc = updated;
        }
    }
}
