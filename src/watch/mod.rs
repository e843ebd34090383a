//! Live result feeds.
//!
//! Turns a pull-style fetch into a stream of snapshots. The background
//! task refetches whenever the store announces a change to one of the
//! watched collections, or on a fixed interval for stores without a
//! change feed. Failed refreshes are retried with backoff; once the retry
//! budget is spent the feed reports `Failed` and stops.
//!
//! Dropping the `WatchHandle` (or calling `unsubscribe`) stops the task.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::interfaces::document_store::DocumentStore;
use crate::utils::retry::{retry_with_backoff, RetryConfig};

/// Latest state of a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedState<T> {
    Loading,
    Ready(T),
    /// Refreshing kept failing; the feed has stopped.
    Failed(String),
}

impl<T> FeedState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            FeedState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Fetches one snapshot.
pub type Fetch<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Feed options.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub poll_interval: Duration,
    pub retry: RetryConfig,
}

impl From<&FeedConfig> for WatchOptions {
    fn from(config: &FeedConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            retry: config.reconnect.retry_config(),
        }
    }
}

/// Cancellation handle and reader for a running feed.
pub struct WatchHandle<T> {
    state: watch::Receiver<FeedState<T>>,
    cancel: watch::Sender<bool>,
}

impl<T: Clone> WatchHandle<T> {
    /// The most recent state.
    pub fn current(&self) -> FeedState<T> {
        self.state.borrow().clone()
    }

    /// Wait for the next state change. Returns None once the feed task ended.
    pub async fn changed(&mut self) -> Option<FeedState<T>> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// Wait until the feed holds a value satisfying `pred`, or fails.
    pub async fn wait_for<F>(&mut self, mut pred: F) -> FeedState<T>
    where
        F: FnMut(&T) -> bool,
    {
        let reached = self
            .state
            .wait_for(|s| match s {
                FeedState::Ready(v) => pred(v),
                FeedState::Failed(_) => true,
                FeedState::Loading => false,
            })
            .await
            .map(|state| state.clone());

        match reached {
            Ok(state) => state,
            // The feed task ended first.
            Err(_) => self.state.borrow().clone(),
        }
    }

    /// Stop the feed.
    pub fn unsubscribe(self) {}
}

impl<T> Drop for WatchHandle<T> {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
    }
}

/// Start a feed over `collections` of `store`.
pub fn watch<T, E>(
    name: &'static str,
    store: Arc<dyn DocumentStore>,
    collections: &[&str],
    options: WatchOptions,
    fetch: Fetch<T, E>,
) -> WatchHandle<T>
where
    T: Clone + Send + Sync + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let (state_tx, state_rx) = watch::channel(FeedState::Loading);
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    let collections: Vec<String> = collections.iter().map(|c| c.to_string()).collect();

    tokio::spawn(async move {
        // Subscribe before the first fetch so no change slips between them.
        let mut changes = store.changes();
        debug!(feed = name, push = changes.is_some(), "Feed started");

        loop {
            let refreshed = tokio::select! {
                result = retry_with_backoff(name, &options.retry, || fetch()) => result,
                _ = cancel_rx.changed() => break,
            };

            match refreshed {
                Ok(value) => {
                    state_tx.send_replace(FeedState::Ready(value));
                }
                Err(e) => {
                    warn!(feed = name, error = %e, "Feed stopped after repeated failures");
                    state_tx.send_replace(FeedState::Failed(e.to_string()));
                    break;
                }
            }

            let mut feed_closed = false;
            let keep_going = match changes.as_mut() {
                Some(rx) => loop {
                    tokio::select! {
                        event = rx.recv() => match event {
                            Ok(event) if collections.contains(&event.collection) => break true,
                            Ok(_) => continue,
                            Err(RecvError::Lagged(skipped)) => {
                                debug!(feed = name, skipped, "Change feed lagged, refreshing");
                                break true;
                            }
                            Err(RecvError::Closed) => {
                                feed_closed = true;
                                break true;
                            }
                        },
                        _ = cancel_rx.changed() => break false,
                    }
                },
                None => {
                    tokio::select! {
                        _ = tokio::time::sleep(options.poll_interval) => true,
                        _ = cancel_rx.changed() => false,
                    }
                }
            };

            if !keep_going {
                break;
            }
            if feed_closed {
                debug!(feed = name, "Change feed closed, falling back to polling");
                changes = None;
            }
        }

        info!(feed = name, "Feed stopped");
    });

    WatchHandle {
        state: state_rx,
        cancel: cancel_tx,
    }
}
