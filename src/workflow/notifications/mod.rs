//! Per-user notification feed.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone};
use futures::FutureExt;
use serde_json::Value;
use tracing::{info, instrument};

use crate::config::FeedConfig;
use crate::interfaces::document_store::{Document, DocumentStore, Query};
use crate::model::{Notification, NotificationKind, Record, NOTIFICATIONS};
use crate::session::Session;
use crate::utils::page::Page;
use crate::watch::{watch, Fetch, WatchHandle, WatchOptions};
use crate::workflow::error::{Result, WorkflowError};
use crate::workflow::WorkflowContext;

/// Filter, search and page for the notification list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationQuery {
    /// None = all types.
    pub kind: Option<NotificationKind>,
    /// Case-insensitive substring of the message.
    pub search: String,
    pub page: usize,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            kind: None,
            search: String::new(),
            page: 1,
        }
    }
}

impl NotificationQuery {
    fn matches(&self, notification: &Notification) -> bool {
        if self.kind.is_some_and(|k| k != notification.kind) {
            return false;
        }
        notification
            .message
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }
}

/// Notifications of one calendar day, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub day: NaiveDate,
    pub items: Vec<Record<Notification>>,
}

/// One rendered page of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationView {
    pub groups: Vec<DayGroup>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl NotificationView {
    /// Filter, paginate, then group the page by day in `tz`.
    ///
    /// `notifications` must already be newest first.
    pub fn build<Tz: TimeZone>(
        notifications: Vec<Record<Notification>>,
        query: &NotificationQuery,
        page_size: usize,
        tz: &Tz,
    ) -> Self {
        let filtered: Vec<_> = notifications
            .into_iter()
            .filter(|r| query.matches(&r.doc))
            .collect();
        let page = Page::slice(filtered, query.page, page_size);

        let mut groups: Vec<DayGroup> = Vec::new();
        for record in page.items {
            let day = record.doc.created_at.with_timezone(tz).date_naive();
            match groups.last_mut() {
                Some(group) if group.day == day => group.items.push(record),
                _ => groups.push(DayGroup {
                    day,
                    items: vec![record],
                }),
            }
        }

        Self {
            groups,
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
        }
    }
}

/// Reads and maintains the signed-in user's notifications.
#[derive(Clone)]
pub struct NotificationFeed {
    ctx: WorkflowContext,
}

impl NotificationFeed {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx }
    }

    /// Every notification of the session's user, newest first.
    pub async fn for_user(&self, session: &Session) -> Result<Vec<Record<Notification>>> {
        let user_id = session.require_user()?;
        fetch_for_user(self.ctx.store.as_ref(), user_id).await
    }

    /// Unread notifications of the session's user.
    pub async fn unread_count(&self, session: &Session) -> Result<usize> {
        let user_id = session.require_user()?;
        count_unread(self.ctx.store.as_ref(), user_id).await
    }

    pub async fn view<Tz: TimeZone>(
        &self,
        session: &Session,
        query: &NotificationQuery,
        tz: &Tz,
    ) -> Result<NotificationView> {
        let all = self.for_user(session).await?;
        Ok(NotificationView::build(
            all,
            query,
            self.ctx.settings.notification_page_size,
            tz,
        ))
    }

    #[instrument(skip_all, fields(notification_id = %id))]
    pub async fn mark_as_read(&self, session: &Session, id: &str) -> Result<()> {
        self.owned(session, id).await?;
        let mut patch = Document::new();
        patch.insert("read".to_string(), Value::Bool(true));
        self.ctx.store.update(NOTIFICATIONS, id, patch).await?;
        info!("Notification marked read");
        Ok(())
    }

    #[instrument(skip_all, fields(notification_id = %id))]
    pub async fn delete(&self, session: &Session, id: &str) -> Result<()> {
        self.owned(session, id).await?;
        self.ctx.store.delete(NOTIFICATIONS, id).await?;
        info!("Notification deleted");
        Ok(())
    }

    /// Live unread badge.
    pub fn watch_unread(
        &self,
        session: &Session,
        config: &FeedConfig,
    ) -> Result<WatchHandle<usize>> {
        let user_id = session.require_user()?.to_string();
        let store = self.ctx.store.clone();
        let fetch: Fetch<usize, WorkflowError> = Arc::new(move || {
            let store = store.clone();
            let user_id = user_id.clone();
            async move { count_unread(store.as_ref(), &user_id).await }.boxed()
        });
        Ok(watch(
            "unread_notifications",
            self.ctx.store.clone(),
            &[NOTIFICATIONS],
            WatchOptions::from(config),
            fetch,
        ))
    }

    /// Live notification list, newest first.
    pub fn watch_list(
        &self,
        session: &Session,
        config: &FeedConfig,
    ) -> Result<WatchHandle<Vec<Record<Notification>>>> {
        let user_id = session.require_user()?.to_string();
        let store = self.ctx.store.clone();
        let fetch: Fetch<Vec<Record<Notification>>, WorkflowError> = Arc::new(move || {
            let store = store.clone();
            let user_id = user_id.clone();
            async move { fetch_for_user(store.as_ref(), &user_id).await }.boxed()
        });
        Ok(watch(
            "notifications",
            self.ctx.store.clone(),
            &[NOTIFICATIONS],
            WatchOptions::from(config),
            fetch,
        ))
    }

    async fn owned(&self, session: &Session, id: &str) -> Result<Record<Notification>> {
        let user_id = session.require_user()?;
        let not_found = || WorkflowError::NotFound {
            collection: NOTIFICATIONS,
            id: id.to_string(),
        };
        let stored = self
            .ctx
            .store
            .get(NOTIFICATIONS, id)
            .await?
            .ok_or_else(not_found)?;
        let record: Record<Notification> = Record::decode(&stored)?;
        // Other users' notifications are indistinguishable from missing ones.
        if record.doc.user_id != user_id {
            return Err(not_found());
        }
        Ok(record)
    }
}

async fn fetch_for_user(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<Record<Notification>>> {
    let docs = store
        .query(&Query::collection(NOTIFICATIONS).where_eq("userId", user_id))
        .await?;
    let mut records: Vec<Record<Notification>> = Record::decode_all(&docs)?;
    records.sort_by(|a, b| b.doc.created_at.cmp(&a.doc.created_at));
    Ok(records)
}

async fn count_unread(store: &dyn DocumentStore, user_id: &str) -> Result<usize> {
    Ok(fetch_for_user(store, user_id)
        .await?
        .iter()
        .filter(|r| !r.doc.read)
        .count())
}
