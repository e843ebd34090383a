//! Explicit session context.
//!
//! Every workflow call receives the acting session instead of reading a
//! process-wide "current user".

use crate::model::{Role, ANONYMOUS_USER};
use crate::workflow::error::{Result, WorkflowError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// None for a signed-out visitor.
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: Some(user_id.into()),
            email: Some(email.into()),
            role: Some(role),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            email: None,
            role: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// The id recorded as author of writes; `Anonymous` when signed out.
    pub fn actor_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(ANONYMOUS_USER)
    }

    /// The signed-in user's id, or `Forbidden` when signed out.
    pub fn require_user(&self) -> Result<&str> {
        self.user_id.as_deref().ok_or(WorkflowError::Forbidden {
            required: "a signed-in user",
        })
    }

    /// Fail with `Forbidden` unless the session holds `role`.
    pub fn require_role(&self, role: Role) -> Result<&str> {
        match (&self.user_id, self.role) {
            (Some(id), Some(r)) if r == role => Ok(id),
            _ => Err(WorkflowError::Forbidden {
                required: role.as_str(),
            }),
        }
    }
}
