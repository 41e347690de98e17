//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting JSON errors into cookie-scoped `CookieError` variants.

use crate::base::error::CookieError;

/// Extension trait for adding cookie context to `serde_json` results.
pub trait JsonResultExt<T> {
    /// Attach the cookie name to a JSON error.
    ///
    /// # Example
    /// ```ignore
    /// use cookieguard::base::context::JsonResultExt;
    ///
    /// let record: ConsentRecord = serde_json::from_str(&raw)
    ///     .cookie_context("cookie_consent")?;
    /// // Error: "Serialization failed for cookie 'cookie_consent': ..."
    /// ```
    fn cookie_context(self, name: &str) -> Result<T, CookieError>;
}

impl<T> JsonResultExt<T> for Result<T, serde_json::Error> {
    fn cookie_context(self, name: &str) -> Result<T, CookieError> {
        self.map_err(|e| CookieError::Serialization {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_context() {
        let result: Result<serde_json::Value, serde_json::Error> = serde_json::from_str("{oops");
        let err = result.cookie_context("prefs").unwrap_err();

        match err {
            CookieError::Serialization { name, message } => {
                assert_eq!(name, "prefs");
                assert!(!message.is_empty());
            }
            _ => panic!("Expected Serialization"),
        }
    }

    #[test]
    fn test_cookie_context_passes_ok_through() {
        let result: Result<u32, serde_json::Error> = serde_json::from_str("42");
        assert_eq!(result.cookie_context("n").unwrap(), 42);
    }
}
