//! Input validation helpers

use once_cell::sync::Lazy;
use regex::Regex;

use super::ServiceError;

/// Minimum admin password length
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Canonical form used for lookups and uniqueness
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject a missing or whitespace-only value
pub fn require(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub fn require_email(email: &str) -> Result<(), ServiceError> {
    require("Email", email)?;
    if !is_valid_email(email) {
        return Err(ServiceError::validation("Invalid email address"));
    }
    Ok(())
}

pub fn require_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: i64) -> Result<(), ServiceError> {
    if value < 0 {
        return Err(ServiceError::Validation(format!("{} must not be negative", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email(" first.last+tag@school.co.uk "));
        assert!(!is_valid_email("ada@"));
        assert!(!is_valid_email("ada.example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_require() {
        assert!(require("Title", "Intro").is_ok());
        assert!(matches!(require("Title", "   "), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_password_length_counts_chars() {
        assert!(require_password("1234567").is_err());
        assert!(require_password("12345678").is_ok());
        assert!(require_password("密码密码密码密码").is_ok());
    }
}
