use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `userId` recorded for quotations submitted without a session.
pub const ANONYMOUS_USER: &str = "Anonymous";

/// Review state of a quotation. Approved and Rejected are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuotationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl QuotationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QuotationStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Pending => "Pending",
            QuotationStatus::Approved => "Approved",
            QuotationStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Canceled,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Canceled => "Canceled",
        })
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "canceled" | "cancelled" => Ok(PaymentStatus::Canceled),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

/// The product line of a quotation, as entered on the product page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub product_name: String,
    /// Kept as entered.
    pub height: String,
    pub width: String,
    #[serde(default)]
    pub additional_requirements: String,
    #[serde(default)]
    pub status: QuotationStatus,
}

/// Quotation document, keyed by the stringified order number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,
    pub city: String,
    pub postal_code: String,
    pub product: ProductRequest,
    pub user_id: String,
    pub order_number: u32,
    /// ISO-8601 submission time.
    pub timestamp: String,
    /// Absent until an admin decides; readers treat absence as Pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QuotationStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub estimate_price: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub commission_percentage: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub commission_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

impl Quotation {
    pub fn status(&self) -> QuotationStatus {
        self.status.unwrap_or_default()
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status.unwrap_or_default()
    }
}

/// `estimate * percentage / 100`, exact in decimal arithmetic.
///
/// `None` when the product does not fit in a `Decimal`.
pub fn commission_value(
    estimate_price: Decimal,
    commission_percentage: Decimal,
) -> Option<Decimal> {
    estimate_price
        .checked_mul(commission_percentage)?
        .checked_div(Decimal::ONE_HUNDRED)
}
