use crate::consent::Category;
use thiserror::Error;

/// Errors raised by the cookie policy layer.
///
/// Each variant carries a stable numeric code (see [`CookieError::as_i32`])
/// in the `-1000..=-1099` range so hosts can report failures without
/// matching on display text.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CookieError {
    // Schema errors
    #[error("Cookie '{name}' is not configured")]
    UnknownCookie { name: String },
    #[error("Value '{value}' is not allowed for cookie '{name}'")]
    InvalidValue { name: String, value: String },
    #[error("Cookie '{name}' only accepts JSON values")]
    ExpectedJson { name: String },
    #[error("Cookie '{name}' is {size} bytes, limit is {max}")]
    ValueTooLarge { name: String, size: usize, max: usize },
    #[error("Serialization failed for cookie '{name}': {message}")]
    Serialization { name: String, message: String },

    // Consent errors
    #[error("Cookie '{name}' requires {category} consent")]
    ConsentRequired { name: String, category: Category },

    // Backup errors
    #[error("No backup available for cookie '{name}'")]
    NoBackup { name: String },
    #[error("Backup checksum mismatch for cookie '{name}' (expected {expected:08x}, got {actual:08x})")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    // Lifecycle errors
    #[error("Cookie '{name}' not found")]
    NotFound { name: String },
    #[error("Cookie '{name}' cannot be extended by {seconds}s")]
    InvalidLifetime { name: String, seconds: i64 },

    // Collaborator and setup errors
    #[error("Cookie store failure: {message}")]
    Store { message: String },
    #[error("Invalid cookie configuration: {message}")]
    Config { message: String },
}

impl CookieError {
    pub fn unknown_cookie(name: impl Into<String>) -> Self {
        CookieError::UnknownCookie { name: name.into() }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        CookieError::NotFound { name: name.into() }
    }

    pub fn store(message: impl Into<String>) -> Self {
        CookieError::Store {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        CookieError::Config {
            message: message.into(),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            CookieError::UnknownCookie { .. } => -1000,
            CookieError::InvalidValue { .. } => -1001,
            CookieError::ExpectedJson { .. } => -1002,
            CookieError::ValueTooLarge { .. } => -1003,
            CookieError::Serialization { .. } => -1004,

            CookieError::ConsentRequired { .. } => -1020,

            CookieError::NoBackup { .. } => -1040,
            CookieError::ChecksumMismatch { .. } => -1041,

            CookieError::NotFound { .. } => -1060,
            CookieError::InvalidLifetime { .. } => -1061,

            CookieError::Store { .. } => -1080,
            CookieError::Config { .. } => -1081,
        }
    }

    /// The cookie this error is about, if any.
    pub fn cookie_name(&self) -> Option<&str> {
        match self {
            CookieError::UnknownCookie { name }
            | CookieError::InvalidValue { name, .. }
            | CookieError::ExpectedJson { name }
            | CookieError::ValueTooLarge { name, .. }
            | CookieError::Serialization { name, .. }
            | CookieError::ConsentRequired { name, .. }
            | CookieError::NoBackup { name }
            | CookieError::ChecksumMismatch { name, .. }
            | CookieError::NotFound { name }
            | CookieError::InvalidLifetime { name, .. } => Some(name),
            CookieError::Store { .. } | CookieError::Config { .. } => None,
        }
    }

    /// Whether the failure came from policy (schema, consent, size) rather
    /// than from the store or the setup.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            CookieError::UnknownCookie { .. }
                | CookieError::InvalidValue { .. }
                | CookieError::ExpectedJson { .. }
                | CookieError::ValueTooLarge { .. }
                | CookieError::ConsentRequired { .. }
        )
    }
}
