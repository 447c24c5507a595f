use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// Who a notification is addressed to
    pub enum Audience {
        All => "all",
        Free => "free",
        Pro => "pro",
        Premium => "premium",
        Admins => "admins",
    }
    default = All;
}

string_enum! {
    pub enum NotificationKind {
        Info => "info",
        Warning => "warning",
        Promotion => "promotion",
        System => "system",
    }
    default = Info;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub audience: Audience,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationInput {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNotificationInput {
    pub title: Option<String>,
    pub message: Option<String>,
    pub audience: Option<Audience>,
    pub kind: Option<NotificationKind>,
    pub is_read: Option<bool>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn from_input(input: CreateNotificationInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title: input.title.trim().to_string(),
            message: input.message,
            audience: input.audience,
            kind: input.kind,
            is_read: false,
            scheduled_at: input.scheduled_at,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateNotificationInput) {
        if let Some(title) = input.title {
            self.title = title.trim().to_string();
        }
        if let Some(message) = input.message {
            self.message = message;
        }
        if let Some(audience) = input.audience {
            self.audience = audience;
        }
        if let Some(kind) = input.kind {
            self.kind = kind;
        }
        if let Some(is_read) = input.is_read {
            self.is_read = is_read;
        }
        if input.scheduled_at.is_some() {
            self.scheduled_at = input.scheduled_at;
        }
        self.updated_at = Utc::now();
    }
}
