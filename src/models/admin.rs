//! Admin model
//!
//! Administrators are the only accounts that sign in to the dashboard.
//! Platform learners are [`super::User`] records and never authenticate here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// Admin role
    ///
    /// The first account created becomes `super_admin`. Only super admins may
    /// change roles or approve other admins.
    pub enum AdminRole {
        SuperAdmin => "super_admin",
        Admin => "admin",
        Moderator => "moderator",
    }
    default = Admin;
}

string_enum! {
    /// What a one-time admin token may be used for
    pub enum TokenPurpose {
        VerifyEmail => "verify_email",
        ResetPassword => "reset_password",
    }
    default = VerifyEmail;
}

/// Dashboard administrator account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AdminRole,
    pub is_verified: bool,
    pub is_approved: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    /// Build an unsaved admin; the password must already be hashed.
    pub fn new(name: String, email: String, password_hash: String, role: AdminRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name,
            email,
            password_hash,
            role,
            is_verified: false,
            is_approved: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }

    /// Verified and approved accounts may hold a session
    pub fn can_sign_in(&self) -> bool {
        self.is_verified && self.is_approved
    }
}

/// Stored one-time token; only the SHA-256 of the secret is persisted
#[derive(Debug, Clone)]
pub struct AdminToken {
    pub token_hash: String,
    pub admin_id: i64,
    pub purpose: TokenPurpose,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AdminToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Fields an administrator may change on another admin
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAdminInput {
    pub name: Option<String>,
    pub role: Option<AdminRole>,
    pub is_approved: Option<bool>,
}
