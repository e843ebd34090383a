//! Identity provider interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email already in use: {0}")]
    EmailInUse(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// An authenticated session issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Stable user identifier.
    pub user_id: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
}

/// Interface for account creation and authentication.
///
/// Roles are not the provider's concern; they live on the user document
/// keyed by the returned user id.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account and return its user id.
    async fn create_account(&self, email: &str, password: &str) -> Result<String>;

    /// Authenticate and open a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Close the current session.
    async fn sign_out(&self) -> Result<()>;

    /// The session opened by the last successful sign-in, if still open.
    async fn current_session(&self) -> Option<AuthSession>;

    /// Remove an account. Used to undo a signup whose follow-up writes failed.
    async fn delete_account(&self, user_id: &str) -> Result<()>;
}
