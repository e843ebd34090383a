//! Signup, login and session resolution.
//!
//! Signup creates the identity account and the profile document, then,
//! when a validated referral code was supplied, links the new user to the
//! referrer and issues one reward to each. A welcome notification is
//! always written. All of it runs as one saga.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::access::{dashboard_for, Route};
use crate::identity::memory::MIN_PASSWORD_LEN;
use crate::interfaces::document_store::{to_document, Query};
use crate::model::{
    Notification, NotificationKind, Record, Reward, RewardStatus, Role, User,
    REFERRAL_REWARD_TYPE, REWARDS, USERS,
};
use crate::session::Session;
use crate::utils::saga::{Compensation, WriteSaga};
use crate::workflow::error::{Result, ValidationError, WorkflowError};
use crate::workflow::{notify, WorkflowContext};

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Whether `email` has a plausible shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Role picked on the login form; must match the stored role.
    pub role: Role,
}

/// The user a referral code belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerDetails {
    pub uid: String,
    pub name: String,
    pub email: String,
}

/// Referral code input that re-validates on every change.
///
/// Each input clears the previous result. The last successful lookup is
/// what signup uses; it is not re-checked at submit time.
#[derive(Debug, Clone, Default)]
pub struct ReferralCodeField {
    code: String,
    details: Option<ReferrerDetails>,
    error: Option<String>,
}

impl ReferralCodeField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle an input event.
    pub async fn input(&mut self, accounts: &AccountService, code: &str) {
        self.code = code.to_string();
        self.details = None;
        self.error = None;

        if code.is_empty() {
            return;
        }

        match accounts.validate_referral_code(code).await {
            Ok(details) => self.details = Some(details),
            Err(WorkflowError::Validation(v)) => self.error = Some(v.user_message()),
            Err(_) => {
                self.error = Some("Failed to validate referral code. Please try again.".to_string())
            }
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn details(&self) -> Option<&ReferrerDetails> {
        self.details.as_ref()
    }

    /// User-facing text for the last failed lookup.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Result of a successful signup.
#[derive(Debug, Clone, PartialEq)]
pub struct SignupOutcome {
    pub user: User,
    /// Referrer linked to, if any.
    pub referrer: Option<ReferrerDetails>,
    pub notification_ids: Vec<String>,
    pub reward_ids: Vec<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub session: Session,
    pub user: User,
    /// Dashboard for the user's role.
    pub landing: Route,
}

#[derive(Clone)]
pub struct AccountService {
    ctx: WorkflowContext,
}

impl AccountService {
    pub fn new(ctx: WorkflowContext) -> Self {
        Self { ctx }
    }

    /// Find the user whose referral id equals `code`.
    pub async fn validate_referral_code(&self, code: &str) -> Result<ReferrerDetails> {
        let found = self
            .ctx
            .store
            .query(&Query::collection(USERS).where_eq("referralId", code))
            .await
            .inspect_err(|e| error!(error = %e, "Referral code lookup failed"))?;

        let Some(stored) = found.first() else {
            warn!(code, "Unknown referral code");
            return Err(ValidationError::InvalidReferralCode(code.to_string()).into());
        };
        let user: User = stored.decode()?;
        Ok(ReferrerDetails {
            uid: user.uid,
            name: user.name,
            email: user.email,
        })
    }

    /// Register a new user.
    ///
    /// `referrer` is the result of a prior `validate_referral_code`; it is
    /// trusted as-is.
    #[tracing::instrument(skip_all, fields(role = %request.role, referred = referrer.is_some()))]
    pub async fn signup(
        &self,
        request: &SignupRequest,
        referrer: Option<&ReferrerDetails>,
    ) -> Result<SignupOutcome> {
        if request.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        if !is_valid_email(&request.email) {
            return Err(ValidationError::InvalidEmail(request.email.clone()).into());
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }

        let user_id = self
            .ctx
            .identity
            .create_account(&request.email, &request.password)
            .await
            .inspect_err(|e| warn!(error = %e, "Account creation failed"))?;

        let mut saga = self.ctx.saga("signup");
        saga.record(Compensation::DeleteAccount {
            user_id: user_id.clone(),
        });

        match self.signup_writes(&mut saga, request, &user_id, referrer).await {
            Ok(outcome) => {
                saga.commit();
                info!(user_id = %user_id, "User signed up");
                Ok(outcome)
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Signup failed");
                saga.abort(&e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn signup_writes(
        &self,
        saga: &mut WriteSaga,
        request: &SignupRequest,
        user_id: &str,
        referrer: Option<&ReferrerDetails>,
    ) -> Result<SignupOutcome> {
        let name = request.name.trim();
        let referral_id = self.ctx.ids.referral_id(Utc::now()).await?;
        let user = User::new(
            user_id.to_string(),
            name.to_string(),
            request.email.clone(),
            request.role,
            referral_id,
        );
        saga.put(USERS, user_id, to_document(&user)?).await?;

        let mut notification_ids = Vec::new();
        let mut reward_ids = Vec::new();

        if let Some(referrer) = referrer {
            saga.array_union(
                USERS,
                &referrer.uid,
                "referrals",
                vec![Value::String(user_id.to_string())],
            )
            .await?;

            notification_ids.push(
                notify(
                    saga,
                    &Notification::new(
                        referrer.uid.clone(),
                        format!("{} has joined using your referral code.", name),
                        NotificationKind::Alert,
                    ),
                )
                .await?,
            );

            reward_ids.push(
                self.issue_reward(
                    saga,
                    &referrer.uid,
                    format!(
                        "You've earned a one-time reward for referring {}. Keep referring more users to earn additional rewards for their first orders!",
                        name
                    ),
                )
                .await?,
            );
            reward_ids.push(
                self.issue_reward(
                    saga,
                    user_id,
                    format!(
                        "Thank you for signing up using a referral code, {}! You've earned a Silver-level commission on your first order. Complete your first order to activate your reward benefits!",
                        name
                    ),
                )
                .await?,
            );
            info!(referrer = %referrer.uid, user_id, "Referral linked");
        }

        notification_ids.push(
            notify(
                saga,
                &Notification::new(
                    user_id,
                    format!(
                        "Welcome to {}, {}! Thank you for joining us and being a part of our growing network.",
                        self.ctx.settings.app_name, name
                    ),
                    NotificationKind::Info,
                ),
            )
            .await?,
        );

        Ok(SignupOutcome {
            user,
            referrer: referrer.cloned(),
            notification_ids,
            reward_ids,
        })
    }

    async fn issue_reward(&self, saga: &mut WriteSaga, user_id: &str, message: String) -> Result<String> {
        let reward = Reward {
            user_id: user_id.to_string(),
            message,
            created_at: Utc::now(),
            status: RewardStatus::Unclaimed,
            kind: REFERRAL_REWARD_TYPE.to_string(),
            coupon_number: self.ctx.ids.coupon_code().await?,
        };
        Ok(saga.create(REWARDS, to_document(&reward)?).await?)
    }

    /// Sign in and check the selected role against the stored one.
    ///
    /// On a role mismatch the fresh session is closed again.
    #[tracing::instrument(skip_all, fields(role = %request.role))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        if !is_valid_email(&request.email) {
            return Err(ValidationError::InvalidEmail(request.email.clone()).into());
        }

        let auth = self
            .ctx
            .identity
            .sign_in(&request.email, &request.password)
            .await
            .inspect_err(|e| warn!(error = %e, "Sign-in failed"))?;

        let record = self
            .ctx
            .load_user(&auth.user_id)
            .await?
            .ok_or_else(|| {
                error!(user_id = %auth.user_id, "No profile for signed-in user");
                WorkflowError::NotFound {
                    collection: USERS,
                    id: auth.user_id.clone(),
                }
            })?;

        if record.doc.role != request.role {
            warn!(user_id = %auth.user_id, stored = %record.doc.role, "Role mismatch at login");
            self.ctx.identity.sign_out().await?;
            return Err(ValidationError::RoleMismatch.into());
        }

        let role = record.doc.role;
        info!(user_id = %auth.user_id, "Logged in");
        Ok(LoginOutcome {
            session: Session::new(auth.user_id, auth.email, role),
            user: record.doc,
            landing: dashboard_for(role),
        })
    }

    pub async fn logout(&self) -> Result<()> {
        self.ctx.identity.sign_out().await?;
        Ok(())
    }

    /// Build the session for whoever is currently signed in.
    ///
    /// Signed out gives an anonymous session. A signed-in user without a
    /// profile document gets a session with no role.
    pub async fn resolve_session(&self) -> Result<Session> {
        let Some(auth) = self.ctx.identity.current_session().await else {
            return Ok(Session::anonymous());
        };

        let role = match self.ctx.load_user(&auth.user_id).await? {
            Some(Record { doc, .. }) => Some(doc.role),
            None => {
                error!(user_id = %auth.user_id, "No user document found");
                None
            }
        };

        Ok(Session {
            user_id: Some(auth.user_id),
            email: Some(auth.email),
            role,
        })
    }
}

#[cfg(test)]
mod tests;
