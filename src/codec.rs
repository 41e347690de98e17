//! Conversion between structured values and stored cookie strings.

use crate::base::context::JsonResultExt;
use crate::base::error::CookieError;
use crate::config::{AllowedValues, CookieDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// A decoded cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieValue {
    Text(String),
    Json(serde_json::Value),
}

impl CookieValue {
    /// Serialize any `serde` value into a JSON cookie value.
    pub fn from_serialize<T: Serialize>(name: &str, value: &T) -> Result<Self, CookieError> {
        serde_json::to_value(value)
            .cookie_context(name)
            .map(CookieValue::Json)
    }

    /// Deserialize the value into `T`.
    ///
    /// Text is tried as a JSON string first, then parsed as JSON, so scalars
    /// written with `set_json` (stored as `42`, `true`) read back typed.
    pub fn deserialize<T: DeserializeOwned>(&self, name: &str) -> Result<T, CookieError> {
        match self {
            CookieValue::Json(value) => serde_json::from_value(value.clone()).cookie_context(name),
            CookieValue::Text(text) => {
                serde_json::from_value(serde_json::Value::String(text.clone()))
                    .or_else(|e| serde_json::from_str(text).map_err(|_| e))
                    .cookie_context(name)
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CookieValue::Text(text) => Some(text),
            CookieValue::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            CookieValue::Json(value) => Some(value),
            CookieValue::Text(_) => None,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, CookieValue::Json(_))
    }
}

impl fmt::Display for CookieValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieValue::Text(text) => f.write_str(text),
            CookieValue::Json(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for CookieValue {
    fn from(value: &str) -> Self {
        CookieValue::Text(value.to_string())
    }
}

impl From<String> for CookieValue {
    fn from(value: String) -> Self {
        CookieValue::Text(value)
    }
}

impl From<serde_json::Value> for CookieValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => CookieValue::Text(text),
            other => CookieValue::Json(other),
        }
    }
}

/// Encode a value for storage, enforcing `max_size` on name plus value.
pub fn encode(name: &str, value: &CookieValue, max_size: usize) -> Result<String, CookieError> {
    let encoded = match value {
        CookieValue::Text(text) => text.clone(),
        CookieValue::Json(json) => serde_json::to_string(json).cookie_context(name)?,
    };

    let size = name.len() + encoded.len();
    if size > max_size {
        return Err(CookieError::ValueTooLarge {
            name: name.to_string(),
            size,
            max: max_size,
        });
    }

    Ok(encoded)
}

/// Decode a stored string. Objects and arrays come back as JSON.
pub fn decode(raw: &str) -> CookieValue {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(raw) {
            return CookieValue::Json(json);
        }
    }
    CookieValue::Text(raw.to_string())
}

/// Check a value against the cookie's schema entry.
pub fn validate(def: &CookieDefinition, value: &CookieValue) -> Result<(), CookieError> {
    match (&def.allowed, value) {
        (AllowedValues::Any, _) => Ok(()),
        (AllowedValues::Json, CookieValue::Json(json)) if json.is_object() || json.is_array() => {
            Ok(())
        }
        (AllowedValues::Json, _) => Err(CookieError::ExpectedJson {
            name: def.name.clone(),
        }),
        (AllowedValues::OneOf(allowed), CookieValue::Text(text))
            if allowed.iter().any(|a| a == text) =>
        {
            Ok(())
        }
        (AllowedValues::OneOf(_), other) => Err(CookieError::InvalidValue {
            name: def.name.clone(),
            value: other.to_string(),
        }),
    }
}
