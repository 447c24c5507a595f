//! Configuration management
//!
//! Configuration is read from `config.yml` and then overridden by
//! `LEARNBOARD_*` environment variables. Missing values fall back to
//! defaults so an empty or absent file still yields a runnable service.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (cookie auth needs an explicit origin)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Public base URL used to build links in outgoing email
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            public_url: default_public_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or `sqlite:` URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/learnboard.db".to_string()
}

/// Admin authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Session token lifetime
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Add the `Secure` attribute to the session cookie
    #[serde(default)]
    pub secure_cookie: bool,
    /// Lifetime of email verification links
    #[serde(default = "default_verification_ttl_hours")]
    pub verification_ttl_hours: i64,
    /// Lifetime of password reset links
    #[serde(default = "default_reset_ttl_minutes")]
    pub reset_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
            verification_ttl_hours: default_verification_ttl_hours(),
            reset_ttl_minutes: default_reset_ttl_minutes(),
        }
    }
}

impl AuthConfig {
    /// True while the signing secret is still the shipped placeholder
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == default_jwt_secret()
    }
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_cookie_name() -> String {
    "admin_token".to_string()
}

fn default_verification_ttl_hours() -> i64 {
    24
}

fn default_reset_ttl_minutes() -> i64 {
    60
}

/// Outgoing mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// When disabled, messages are written to the log instead of sent
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: default_from_address(),
            from_name: default_from_name(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "no-reply@learnboard.local".to_string()
}

fn default_from_name() -> String {
    "Learnboard".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration. Invalid
    /// YAML is reported with its line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file, then apply environment overrides
    ///
    /// Recognised variables:
    /// - LEARNBOARD_SERVER_HOST, LEARNBOARD_SERVER_PORT
    /// - LEARNBOARD_SERVER_CORS_ORIGIN, LEARNBOARD_SERVER_PUBLIC_URL
    /// - LEARNBOARD_DATABASE_URL
    /// - LEARNBOARD_AUTH_JWT_SECRET, LEARNBOARD_AUTH_TOKEN_TTL_HOURS
    /// - LEARNBOARD_AUTH_COOKIE_NAME, LEARNBOARD_AUTH_SECURE_COOKIE
    /// - LEARNBOARD_MAIL_ENABLED, LEARNBOARD_MAIL_SMTP_HOST, LEARNBOARD_MAIL_SMTP_PORT
    /// - LEARNBOARD_MAIL_SMTP_USERNAME, LEARNBOARD_MAIL_SMTP_PASSWORD
    /// - LEARNBOARD_MAIL_FROM_ADDRESS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LEARNBOARD_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("LEARNBOARD_SERVER_PORT") {
            self.server.port = port;
        }
        if let Ok(origin) = std::env::var("LEARNBOARD_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Ok(public_url) = std::env::var("LEARNBOARD_SERVER_PUBLIC_URL") {
            self.server.public_url = public_url;
        }

        if let Ok(url) = std::env::var("LEARNBOARD_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(secret) = std::env::var("LEARNBOARD_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(ttl) = env_parse::<i64>("LEARNBOARD_AUTH_TOKEN_TTL_HOURS") {
            self.auth.token_ttl_hours = ttl;
        }
        if let Ok(name) = std::env::var("LEARNBOARD_AUTH_COOKIE_NAME") {
            self.auth.cookie_name = name;
        }
        if let Some(secure) = env_bool("LEARNBOARD_AUTH_SECURE_COOKIE") {
            self.auth.secure_cookie = secure;
        }

        if let Some(enabled) = env_bool("LEARNBOARD_MAIL_ENABLED") {
            self.mail.enabled = enabled;
        }
        if let Ok(host) = std::env::var("LEARNBOARD_MAIL_SMTP_HOST") {
            self.mail.smtp_host = host;
        }
        if let Some(port) = env_parse::<u16>("LEARNBOARD_MAIL_SMTP_PORT") {
            self.mail.smtp_port = port;
        }
        if let Ok(username) = std::env::var("LEARNBOARD_MAIL_SMTP_USERNAME") {
            self.mail.smtp_username = username;
        }
        if let Ok(password) = std::env::var("LEARNBOARD_MAIL_SMTP_PASSWORD") {
            self.mail.smtp_password = password;
        }
        if let Ok(from) = std::env::var("LEARNBOARD_MAIL_FROM_ADDRESS") {
            self.mail.from_address = from;
        }
    }
}

/// Parse an environment variable, ignoring values that do not parse
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn configured_port_round_trips(port in 1u16..=65535) {
            let mut file = NamedTempFile::new().unwrap();
            write!(file, "server:\n  port: {}\n", port).unwrap();
            let config = Config::load(file.path()).unwrap();
            prop_assert_eq!(config.server.port, port);
        }

        #[test]
        fn env_port_override_applies(port in 1u16..=65535) {
            let _guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let file = NamedTempFile::new().unwrap();
            std::env::set_var("LEARNBOARD_SERVER_PORT", port.to_string());
            let config = Config::load_with_env(file.path()).unwrap();
            std::env::remove_var("LEARNBOARD_SERVER_PORT");
            prop_assert_eq!(config.server.port, port);
        }
    }
}
