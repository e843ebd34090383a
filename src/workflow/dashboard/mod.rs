//! Role dashboards.
//!
//! Read models for the Dealer, Admin and Installer landing pages, plus the
//! two writes issued from them: installer approval and project status.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::interfaces::document_store::{to_document, Query, StoredDocument};
use crate::model::{
    InstallerStatus, Project, ProjectStatus, Quotation, Record, Role, User, ORDERS, PROJECTS,
    QUOTATIONS, USERS,
};
use crate::session::Session;
use crate::workflow::error::{Result, WorkflowError};
use crate::workflow::review::QuotationStats;
use crate::workflow::WorkflowContext;

#[derive(Debug, Clone, PartialEq)]
pub struct DealerSummary {
    pub name: String,
    pub total_earnings: Decimal,
    /// Quotations submitted by the dealer.
    pub quotations: Vec<Record<Quotation>>,
    pub referral_id: String,
    pub referral_count: usize,
}

/// Counts over the `orders` collection by raw status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrdersReport {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub approved: usize,
}

impl OrdersReport {
    pub fn from_orders(orders: &[StoredDocument]) -> Self {
        let mut report = Self {
            total: orders.len(),
            ..Default::default()
        };
        for order in orders {
            match order.data.get("status").and_then(Value::as_str) {
                Some("Completed") => report.completed += 1,
                Some("Pending") => report.pending += 1,
                Some("Approved") => report.approved += 1,
                _ => {}
            }
        }
        report
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminOverview {
    pub stats: QuotationStats,
    pub dealers: Vec<Record<User>>,
    pub installers: Vec<Record<User>>,
    pub orders: OrdersReport,
}

/// Number of projects per status; statuses with no project are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectStatusCounts(HashMap<ProjectStatus, usize>);

impl ProjectStatusCounts {
    pub fn from_projects<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Self {
        let mut counts = HashMap::new();
        for project in projects {
            *counts.entry(project.status).or_insert(0) += 1;
        }
        Self(counts)
    }

    pub fn get(&self, status: ProjectStatus) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Non-zero counts in display order.
    pub fn entries(&self) -> Vec<(ProjectStatus, usize)> {
        ProjectStatus::ALL
            .iter()
            .filter_map(|s| self.0.get(s).map(|n| (*s, *n)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstallerSummary {
    pub name: String,
    pub status: InstallerStatus,
    pub projects: Vec<Record<Project>>,
    pub counts: ProjectStatusCounts,
}

#[derive(Serialize)]
struct StatusPatch<S> {
    status: S,
}

#[derive(Clone)]
pub struct DashboardService {
    ctx: WorkflowContext,
}

impl DashboardService {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx }
    }

    pub async fn dealer_summary(&self, session: &Session) -> Result<DealerSummary> {
        let user_id = session.require_role(Role::Dealer)?;
        let user = self.profile(user_id).await?;

        let docs = self
            .ctx
            .store
            .query(&Query::collection(QUOTATIONS).where_eq("userId", user_id))
            .await?;
        let quotations = Record::decode_all(&docs)?;

        Ok(DealerSummary {
            name: user.name,
            total_earnings: user.total_earnings.unwrap_or_default(),
            quotations,
            referral_count: user.referrals.len(),
            referral_id: user.referral_id,
        })
    }

    pub async fn admin_overview(&self, session: &Session) -> Result<AdminOverview> {
        session.require_role(Role::Admin)?;
        let store = &self.ctx.store;

        let quotations: Vec<Record<Quotation>> =
            Record::decode_all(&store.query(&Query::collection(QUOTATIONS)).await?)?;
        let dealers = Record::decode_all(
            &store
                .query(&Query::collection(USERS).where_eq("role", Role::Dealer.as_str()))
                .await?,
        )?;
        let installers = Record::decode_all(
            &store
                .query(&Query::collection(USERS).where_eq("role", Role::Installer.as_str()))
                .await?,
        )?;
        let orders = OrdersReport::from_orders(&store.query(&Query::collection(ORDERS)).await?);

        Ok(AdminOverview {
            stats: QuotationStats::from_quotations(quotations.iter().map(|r| &r.doc)),
            dealers,
            installers,
            orders,
        })
    }

    /// Mark an installer's account Approved.
    #[instrument(skip_all, fields(installer_id = %installer_id))]
    pub async fn approve_installer(&self, session: &Session, installer_id: &str) -> Result<()> {
        session.require_role(Role::Admin)?;
        let user = self.profile(installer_id).await?;
        if user.role != Role::Installer {
            return Err(WorkflowError::NotFound {
                collection: USERS,
                id: installer_id.to_string(),
            });
        }

        let patch = to_document(&StatusPatch {
            status: InstallerStatus::Approved,
        })?;
        self.ctx.store.update(USERS, installer_id, patch).await?;
        info!("Installer approved");
        Ok(())
    }

    pub async fn installer_summary(&self, session: &Session) -> Result<InstallerSummary> {
        let user_id = session.require_role(Role::Installer)?;
        let user = self.profile(user_id).await?;

        let docs = self
            .ctx
            .store
            .query(&Query::collection(PROJECTS).where_eq("installerId", user_id))
            .await?;
        let projects: Vec<Record<Project>> = Record::decode_all(&docs)?;
        let counts = ProjectStatusCounts::from_projects(projects.iter().map(|r| &r.doc));

        Ok(InstallerSummary {
            name: user.name,
            status: user.status.unwrap_or_default(),
            projects,
            counts,
        })
    }

    /// Move one of the installer's own projects to `status`.
    #[instrument(skip_all, fields(project_id = %project_id, status = ?status))]
    pub async fn update_project_status(
        &self,
        session: &Session,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<()> {
        let user_id = session.require_role(Role::Installer)?;
        let not_found = || WorkflowError::NotFound {
            collection: PROJECTS,
            id: project_id.to_string(),
        };
        let stored = self
            .ctx
            .store
            .get(PROJECTS, project_id)
            .await?
            .ok_or_else(not_found)?;
        let project: Project = stored.decode()?;
        if project.installer_id != user_id {
            return Err(not_found());
        }

        let patch = to_document(&StatusPatch { status })?;
        self.ctx.store.update(PROJECTS, project_id, patch).await?;
        info!("Project status updated");
        Ok(())
    }

    async fn profile(&self, user_id: &str) -> Result<User> {
        Ok(self
            .ctx
            .load_user(user_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound {
                collection: USERS,
                id: user_id.to_string(),
            })?
            .doc)
    }
}

#[cfg(test)]
mod tests;
