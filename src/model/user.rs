use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dashboard role stored on the user document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Dealer,
    Installer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Dealer => "Dealer",
            Role::Installer => "Installer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "dealer" => Ok(Role::Dealer),
            "installer" => Ok(Role::Installer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Installer onboarding state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallerStatus {
    #[default]
    Pending,
    Approved,
}

/// User profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub referral_id: String,
    /// Ids of users who signed up with this user's referral id.
    #[serde(default)]
    pub referrals: Vec<String>,
    /// Dealers only.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub total_earnings: Option<Decimal>,
    /// Installers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InstallerStatus>,
}

impl User {
    /// A fresh profile with the role-specific defaults applied.
    pub fn new(uid: String, name: String, email: String, role: Role, referral_id: String) -> Self {
        Self {
            uid,
            name,
            email,
            role,
            referral_id,
            referrals: Vec::new(),
            total_earnings: (role == Role::Dealer).then_some(Decimal::ZERO),
            status: (role == Role::Installer).then_some(InstallerStatus::Pending),
        }
    }
}
