//! Signed session tokens (HS256 JWT)

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::models::{Admin, AdminRole};

/// JWT claims carried by the admin session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin id
    pub sub: String,
    pub email: String,
    pub role: AdminRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn admin_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Issues and verifies session tokens
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl SessionTokens {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds: ttl_hours.max(1) * 3600,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_hours)
    }

    /// Token lifetime, used as the cookie Max-Age
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub fn issue(&self, admin: &Admin) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: admin.id.to_string(),
            email: admin.email.clone(),
            role: admin.role,
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Check signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}
