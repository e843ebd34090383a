//! Workflow error types.

use crate::interfaces::document_store::StoreError;
use crate::interfaces::identity::AuthError;
use crate::model::QuotationStatus;
use crate::utils::ids::IdError;
use rust_decimal::Decimal;

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Message shown for remote failures whose details are only logged.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Input rejected before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid referral code: {0}")]
    InvalidReferralCode(String),

    #[error("Approval is missing estimate price, commission percentage or payment status")]
    IncompleteApproval,

    #[error("Selected role does not match the account")]
    RoleMismatch,

    #[error("Product {0} is not in the cart")]
    ProductNotInCart(u32),

    #[error("Unknown product {0}")]
    UnknownProduct(u32),

    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Commission for estimate {estimate} at {percentage}% is out of range")]
    AmountOutOfRange { estimate: Decimal, percentage: Decimal },
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::MissingField(field) => format!("Please fill in the {} field.", field),
            ValidationError::InvalidEmail(_) => "Please enter a valid email.".to_string(),
            ValidationError::InvalidReferralCode(_) => {
                "Invalid referral code. Please check and try again.".to_string()
            }
            ValidationError::IncompleteApproval => {
                "Please fill in all fields before approving.".to_string()
            }
            ValidationError::RoleMismatch => {
                "The role you selected does not match your credentials.".to_string()
            }
            ValidationError::ProductNotInCart(_) => {
                "That product is no longer in your cart.".to_string()
            }
            ValidationError::UnknownProduct(_) => "Product not found.".to_string(),
            ValidationError::WeakPassword { min } => {
                format!("Password should be at least {} characters.", min)
            }
            ValidationError::AmountOutOfRange { .. } => {
                "Please enter a smaller amount.".to_string()
            }
        }
    }
}

/// Errors from workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Not found: collection={collection}, id={id}")]
    NotFound { collection: &'static str, id: String },

    #[error("Quotation {id} is already {status}")]
    AlreadyDecided { id: String, status: QuotationStatus },

    #[error("Forbidden: requires {required}")]
    Forbidden { required: &'static str },

    #[error("No unused {kind} after {attempts} attempts")]
    IdSpaceExhausted { kind: &'static str, attempts: u32 },
}

impl From<IdError> for WorkflowError {
    fn from(err: IdError) -> Self {
        match err {
            IdError::Exhausted { kind, attempts } => {
                WorkflowError::IdSpaceExhausted { kind, attempts }
            }
            IdError::Store(e) => WorkflowError::Store(e),
        }
    }
}

impl WorkflowError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Validation(v) => v.user_message(),
            WorkflowError::Auth(AuthError::EmailInUse(_)) => {
                "This email is already in use. Please try logging in or use a different email."
                    .to_string()
            }
            WorkflowError::Auth(AuthError::WeakPassword { min }) => {
                ValidationError::WeakPassword { min: *min }.user_message()
            }
            WorkflowError::Auth(AuthError::InvalidCredentials) => {
                "Failed to log in. Please check your email and password.".to_string()
            }
            WorkflowError::NotFound { collection, .. } if *collection == crate::model::USERS => {
                "No user data found. Please contact support.".to_string()
            }
            WorkflowError::NotFound { .. } => "No data found.".to_string(),
            WorkflowError::AlreadyDecided { status, .. } => {
                format!("This quotation has already been {}.", status.as_str().to_lowercase())
            }
            WorkflowError::Forbidden { .. } => {
                "You do not have access to this action.".to_string()
            }
            WorkflowError::Store(_)
            | WorkflowError::Auth(_)
            | WorkflowError::IdSpaceExhausted { .. } => GENERIC_FAILURE.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }
}
