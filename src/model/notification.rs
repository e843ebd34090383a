use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Alert,
    Reminder,
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(NotificationKind::Info),
            "alert" => Ok(NotificationKind::Alert),
            "reminder" => Ok(NotificationKind::Reminder),
            other => Err(format!("unknown notification type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Always written as a boolean; legacy `"true"`/`"false"` strings are accepted.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub read: bool,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<u32>,
}

impl Notification {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            created_at: Utc::now(),
            read: false,
            kind,
            order_number: None,
        }
    }

    pub fn for_order(mut self, order_number: u32) -> Self {
        self.order_number = Some(order_number);
        self
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Text(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Text(s) => Ok(s.eq_ignore_ascii_case("true")),
    }
}
