//! View rendering errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    /// A template name with no embedded file behind it
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Parse or render failure, with the full Tera cause chain
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Embedded file was not valid UTF-8
    #[error("Invalid template encoding: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
