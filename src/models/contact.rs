//! Contact form submissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    pub enum ContactStatus {
        New => "new",
        InProgress => "in-progress",
        Resolved => "resolved",
        Closed => "closed",
    }
    default = New;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub category: Option<String>,
    pub status: ContactStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Open submissions still need an admin's attention
    pub fn is_open(&self) -> bool {
        matches!(self.status, ContactStatus::New | ContactStatus::InProgress)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Admins may only triage a submission, never rewrite it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContactInput {
    pub status: Option<ContactStatus>,
    pub admin_notes: Option<String>,
}

impl Contact {
    pub fn from_input(input: CreateContactInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            subject: input.subject.filter(|s| !s.trim().is_empty()),
            message: input.message,
            category: input.category.filter(|c| !c.trim().is_empty()),
            status: ContactStatus::New,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateContactInput) {
        if let Some(status) = input.status {
            self.status = status;
        }
        super::merge_optional(&mut self.admin_notes, input.admin_notes);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_wire_name() {
        let status: ContactStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, ContactStatus::InProgress);
        assert_eq!(status.to_string(), "in-progress");
    }

    #[test]
    fn test_new_contact_is_open() {
        let contact = Contact::from_input(CreateContactInput {
            name: "Sam".to_string(),
            email: "Sam@Example.com".to_string(),
            subject: Some(" ".to_string()),
            message: "Help".to_string(),
            category: None,
        });
        assert!(contact.is_open());
        assert!(contact.subject.is_none());
        assert_eq!(contact.email, "sam@example.com");
    }
}
