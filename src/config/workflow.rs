//! Workflow, saga and live-feed configuration types.

use std::time::Duration;

use serde::Deserialize;

use crate::utils::retry::RetryConfig;

/// Default product name used in the welcome notification.
pub const DEFAULT_APP_NAME: &str = "DXD Dealer-Installer Manager";

/// Quotation workflow settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Quotations per page on the review board.
    pub quotation_page_size: usize,
    /// Notifications per page in the feed.
    pub notification_page_size: usize,
    /// Products per page in the catalog.
    pub catalog_page_size: usize,
    /// Check generated order numbers and coupon codes against the store
    /// and redraw on collision.
    pub enforce_unique_ids: bool,
    /// Draws attempted before giving up on a unique id.
    pub id_attempts: u32,
    /// Name used in the welcome notification.
    pub app_name: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            quotation_page_size: 4,
            notification_page_size: 5,
            catalog_page_size: 8,
            enforce_unique_ids: true,
            id_attempts: 8,
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

/// Multi-write consistency settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SagaConfig {
    /// Undo earlier writes of an operation when a later write fails.
    /// When false, partial writes are left in place and only logged.
    pub compensate: bool,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self { compensate: true }
    }
}

/// Live feed settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Refresh interval used when the store has no change feed.
    pub poll_interval_ms: u64,
    /// Backoff applied when a refresh fails.
    pub reconnect: ReconnectConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Reconnect backoff for live feeds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Consecutive failures tolerated before the feed gives up.
    pub max_retries: u32,
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 100,
            max_delay_ms: 5000,
            max_retries: 10,
            jitter: 0.25,
        }
    }
}

impl ReconnectConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_retries: self.max_retries,
            jitter: self.jitter,
        }
    }
}

/// Static catalog settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to a products JSON file. None = empty catalog.
    pub path: Option<String>,
}
