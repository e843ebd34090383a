//! Short human-shareable identifiers.
//!
//! Order numbers and coupon codes are six-digit draws. With uniqueness
//! enforcement on, each draw is checked against the store and redrawn on
//! collision; with it off, draws are used as-is and may collide.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::warn;

use crate::interfaces::document_store::{DocumentStore, Query, StoreError};
use crate::model::{QUOTATIONS, REWARDS, USERS};

/// Smallest order number.
pub const ORDER_NUMBER_MIN: u32 = 100_000;
/// Largest order number.
pub const ORDER_NUMBER_MAX: u32 = 999_999;
/// Upper bound of the random suffix of a referral id.
pub const REFERRAL_SUFFIX_MAX: u32 = 999_999;
/// Prefix of every coupon code.
pub const COUPON_PREFIX: &str = "CPN-";

/// Errors from identifier generation.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("No unused {kind} after {attempts} attempts")]
    Exhausted { kind: &'static str, attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Source of uniformly drawn integers.
pub trait NumberSource: Send + Sync {
    /// Draw an integer in `low..=high`.
    fn next_in(&self, low: u32, high: u32) -> u32;
}

/// Thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSource;

impl NumberSource for RandomSource {
    fn next_in(&self, low: u32, high: u32) -> u32 {
        rand::rng().random_range(low..=high)
    }
}

/// Replays fixed values, repeating the last one once exhausted.
///
/// Values are clamped into the requested range.
#[derive(Debug)]
pub struct SequenceSource {
    values: Mutex<VecDeque<u32>>,
    last: Mutex<u32>,
}

impl SequenceSource {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
            last: Mutex::new(0),
        }
    }
}

impl NumberSource for SequenceSource {
    fn next_in(&self, low: u32, high: u32) -> u32 {
        let next = self.values.lock().ok().and_then(|mut v| v.pop_front());
        let value = match self.last.lock() {
            Ok(mut last) => {
                if let Some(n) = next {
                    *last = n;
                }
                *last
            }
            Err(_) => next.unwrap_or(low),
        };
        value.clamp(low, high)
    }
}

/// Format a coupon code.
pub fn coupon_code(n: u32) -> String {
    format!("{}{}", COUPON_PREFIX, n)
}

/// Format a referral id from a timestamp and random suffix.
pub fn referral_id(now: DateTime<Utc>, suffix: u32) -> String {
    format!("ref-{}-{}", now.timestamp_millis(), suffix)
}

/// Draws identifiers, optionally checking them against the store.
#[derive(Clone)]
pub struct IdGenerator {
    source: Arc<dyn NumberSource>,
    store: Arc<dyn DocumentStore>,
    enforce_unique: bool,
    attempts: u32,
}

impl IdGenerator {
    pub fn new(
        source: Arc<dyn NumberSource>,
        store: Arc<dyn DocumentStore>,
        enforce_unique: bool,
        attempts: u32,
    ) -> Self {
        Self {
            source,
            store,
            enforce_unique,
            attempts: attempts.max(1),
        }
    }

    /// A six-digit order number not used by any stored quotation.
    pub async fn order_number(&self) -> Result<u32, IdError> {
        if !self.enforce_unique {
            return Ok(self.source.next_in(ORDER_NUMBER_MIN, ORDER_NUMBER_MAX));
        }
        for _ in 0..self.attempts {
            let n = self.source.next_in(ORDER_NUMBER_MIN, ORDER_NUMBER_MAX);
            if self.store.get(QUOTATIONS, &n.to_string()).await?.is_none() {
                return Ok(n);
            }
            warn!(order_number = n, "Order number collision, redrawing");
        }
        Err(IdError::Exhausted {
            kind: "order number",
            attempts: self.attempts,
        })
    }

    /// A coupon code not held by any stored reward.
    pub async fn coupon_code(&self) -> Result<String, IdError> {
        self.unique("coupon code", REWARDS, "couponNumber", || {
            coupon_code(self.source.next_in(ORDER_NUMBER_MIN, ORDER_NUMBER_MAX))
        })
        .await
    }

    /// A referral id not held by any stored user.
    pub async fn referral_id(&self, now: DateTime<Utc>) -> Result<String, IdError> {
        self.unique("referral id", USERS, "referralId", || {
            referral_id(now, self.source.next_in(0, REFERRAL_SUFFIX_MAX))
        })
        .await
    }

    async fn unique<F>(
        &self,
        kind: &'static str,
        collection: &str,
        field: &str,
        mut draw: F,
    ) -> Result<String, IdError>
    where
        F: FnMut() -> String,
    {
        if !self.enforce_unique {
            return Ok(draw());
        }
        for _ in 0..self.attempts {
            let candidate = draw();
            let taken = self
                .store
                .query(&Query::collection(collection).where_eq(field, candidate.as_str()))
                .await?;
            if taken.is_empty() {
                return Ok(candidate);
            }
            warn!(kind, candidate = %candidate, "Identifier collision, redrawing");
        }
        Err(IdError::Exhausted {
            kind,
            attempts: self.attempts,
        })
    }
}
