//! In-memory identity provider.
//!
//! Accounts are keyed by lower-cased email. Passwords are stored as
//! salted SHA-256 digests; the plain text is never retained.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::interfaces::identity::{AuthError, AuthSession, IdentityProvider, Result};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    email: String,
    salt: String,
    digest: String,
}

/// In-memory identity provider for standalone use and tests.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<AuthSession>>,
    unavailable: RwLock<bool>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail until cleared.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Number of registered accounts.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    async fn check_available(&self) -> Result<()> {
        if *self.unavailable.read().await {
            return Err(AuthError::Unavailable("identity provider offline".to_string()));
        }
        Ok(())
    }

    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn normalize(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<String> {
        self.check_available().await?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }

        let key = Self::normalize(email);
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse(email.to_string()));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let account = Account {
            user_id: Uuid::new_v4().simple().to_string(),
            email: email.trim().to_string(),
            digest: Self::digest(&salt, password),
            salt,
        };
        let user_id = account.user_id.clone();
        accounts.insert(key, account);

        info!(user_id = %user_id, "Account created");
        Ok(user_id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.check_available().await?;
        let account = self
            .accounts
            .read()
            .await
            .get(&Self::normalize(email))
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        if Self::digest(&account.salt, password) != account.digest {
            debug!(user_id = %account.user_id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let session = AuthSession {
            user_id: account.user_id,
            email: account.email,
            issued_at: Utc::now(),
        };
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.check_available().await?;
        *self.session.write().await = None;
        Ok(())
    }

    async fn current_session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    async fn delete_account(&self, user_id: &str) -> Result<()> {
        self.check_available().await?;
        let mut accounts = self.accounts.write().await;
        let key = accounts
            .iter()
            .find(|(_, a)| a.user_id == user_id)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| AuthError::AccountNotFound(user_id.to_string()))?;
        accounts.remove(&key);

        let mut session = self.session.write().await;
        if session.as_ref().is_some_and(|s| s.user_id == user_id) {
            *session = None;
        }

        info!(user_id, "Account deleted");
        Ok(())
    }
}
