//! Cookie schema and policy configuration.
//!
//! A [`CookieConfig`] can be deserialized from JSON or assembled in code:
//!
//! ```rust
//! use cookieguard::config::{CookieConfig, CookieDefinition};
//! use cookieguard::consent::Category;
//!
//! let config = CookieConfig::builder()
//!     .cookie(CookieDefinition::new("theme").one_of(["light", "dark"]).category(Category::Functional))
//!     .cookie(CookieDefinition::new("session").critical(true))
//!     .build()
//!     .unwrap();
//!
//! assert!(config.definition("theme").is_some());
//! ```

use crate::base::error::CookieError;
use crate::consent::Category;
use crate::store::{CookieOptions, SameSite};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Default size limit for a stored cookie (name plus value), in bytes.
pub const DEFAULT_MAX_SIZE: usize = 4096;

/// Values a configured cookie accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedValues {
    /// Any text or JSON value.
    #[default]
    Any,
    /// One of a fixed set of text values.
    OneOf(Vec<String>),
    /// JSON objects or arrays only.
    Json,
}

/// Schema entry for one cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieDefinition {
    pub name: String,
    #[serde(default)]
    pub allowed: AllowedValues,
    #[serde(default)]
    pub category: Category,
    /// Critical cookies are backed up on every write.
    #[serde(default)]
    pub critical: bool,
    /// Overrides for the configured default options.
    #[serde(default)]
    pub options: CookieOptions,
}

impl CookieDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed: AllowedValues::Any,
            category: Category::Necessary,
            critical: false,
            options: CookieOptions::default(),
        }
    }

    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.allowed = AllowedValues::OneOf(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn json(mut self) -> Self {
        self.allowed = AllowedValues::Json;
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }
}

/// Consent layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    /// When false every category is treated as granted.
    pub enabled: bool,
    pub cookie_name: String,
    /// Records stored for another version are ignored.
    pub version: u32,
    /// Lifetime of the consent cookie in seconds.
    pub max_age: i64,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cookie_name: "cookie_consent".to_string(),
            version: 1,
            max_age: 365 * 24 * 60 * 60,
        }
    }
}

/// Backup layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Snapshots kept per critical cookie.
    pub max_backups: usize,
    pub key_prefix: String,
    pub verify_checksum: bool,
    /// Lifetime of the history cookies in seconds. Independent of the
    /// backed-up cookie so an expired cookie stays recoverable.
    pub max_age: i64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            max_backups: 3,
            key_prefix: "__backup_".to_string(),
            verify_checksum: true,
            max_age: 365 * 24 * 60 * 60,
        }
    }
}

/// Expiration layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirationConfig {
    /// Remaining lifetime, in seconds, at which a cookie counts as expiring soon.
    pub warning_threshold: i64,
    pub key_prefix: String,
    /// Lifetime of the expiry record cookies in seconds.
    pub record_max_age: i64,
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            warning_threshold: 24 * 60 * 60,
            key_prefix: "__exp_".to_string(),
            record_max_age: 365 * 24 * 60 * 60,
        }
    }
}

/// Complete policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    cookies: Vec<CookieDefinition>,
    pub max_size: usize,
    pub defaults: CookieOptions,
    pub consent: ConsentConfig,
    pub backup: BackupConfig,
    pub expiration: ExpirationConfig,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            cookies: Vec::new(),
            max_size: DEFAULT_MAX_SIZE,
            defaults: CookieOptions::new().path("/").same_site(SameSite::Lax),
            consent: ConsentConfig::default(),
            backup: BackupConfig::default(),
            expiration: ExpirationConfig::default(),
            index: BTreeMap::new(),
        }
    }
}

impl CookieConfig {
    pub fn builder() -> CookieConfigBuilder {
        CookieConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, CookieError> {
        let config: CookieConfig =
            serde_json::from_str(json).map_err(|e| CookieError::config(e.to_string()))?;
        config.finish()
    }

    /// Read and validate a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self, CookieError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| CookieError::config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Check the schema and settings for contradictions.
    pub fn validate(&self) -> Result<(), CookieError> {
        if self.max_size == 0 {
            return Err(CookieError::config("max_size must be greater than zero"));
        }
        if self.backup.max_backups == 0 {
            return Err(CookieError::config("backup.max_backups must be greater than zero"));
        }
        if self.backup.key_prefix.is_empty() || self.expiration.key_prefix.is_empty() {
            return Err(CookieError::config("derived key prefixes must not be empty"));
        }
        if self.expiration.warning_threshold < 0 || self.expiration.record_max_age <= 0 {
            return Err(CookieError::config("expiration durations must not be negative"));
        }
        if self.backup.max_age <= 0 {
            return Err(CookieError::config("backup.max_age must be greater than zero"));
        }
        if self.consent.cookie_name.is_empty() {
            return Err(CookieError::config("consent.cookie_name must not be empty"));
        }

        let mut seen = BTreeSet::new();
        for def in &self.cookies {
            if def.name.is_empty() {
                return Err(CookieError::config("cookie names must not be empty"));
            }
            if !seen.insert(def.name.as_str()) {
                return Err(CookieError::config(format!(
                    "cookie '{}' is defined twice",
                    def.name
                )));
            }
            if def.name == self.consent.cookie_name {
                return Err(CookieError::config(format!(
                    "cookie '{}' collides with the consent cookie",
                    def.name
                )));
            }
            if def.name.starts_with(&self.backup.key_prefix)
                || def.name.starts_with(&self.expiration.key_prefix)
            {
                return Err(CookieError::config(format!(
                    "cookie '{}' uses a reserved key prefix",
                    def.name
                )));
            }
            if matches!(&def.allowed, AllowedValues::OneOf(values) if values.is_empty()) {
                return Err(CookieError::config(format!(
                    "cookie '{}' allows no values",
                    def.name
                )));
            }
        }

        Ok(())
    }

    pub fn definition(&self, name: &str) -> Option<&CookieDefinition> {
        self.index.get(name).map(|&i| &self.cookies[i])
    }

    /// Definition for `name`, or `UnknownCookie`.
    pub fn require(&self, name: &str) -> Result<&CookieDefinition, CookieError> {
        self.definition(name)
            .ok_or_else(|| CookieError::unknown_cookie(name))
    }

    /// Defaults merged with the cookie's own options.
    pub fn options_for(&self, def: &CookieDefinition) -> CookieOptions {
        self.defaults.merge(&def.options)
    }

    pub fn definitions(&self) -> &[CookieDefinition] {
        &self.cookies
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.iter().map(|d| d.name.as_str())
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &CookieDefinition> {
        self.cookies.iter().filter(move |d| d.category == category)
    }

    pub fn backup_key(&self, name: &str) -> String {
        format!("{}{}", self.backup.key_prefix, name)
    }

    pub fn expiry_key(&self, name: &str) -> String {
        format!("{}{}", self.expiration.key_prefix, name)
    }

    fn finish(mut self) -> Result<Self, CookieError> {
        self.validate()?;
        self.index = self
            .cookies
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        Ok(self)
    }
}

/// Builder for creating a [`CookieConfig`].
#[derive(Default)]
pub struct CookieConfigBuilder {
    config: CookieConfig,
}

impl CookieConfigBuilder {
    /// Add a cookie to the schema.
    pub fn cookie(mut self, definition: CookieDefinition) -> Self {
        self.config.cookies.push(definition);
        self
    }

    /// Set the size limit for name plus encoded value.
    pub fn max_size(mut self, bytes: usize) -> Self {
        self.config.max_size = bytes;
        self
    }

    /// Set options applied to every cookie.
    pub fn defaults(mut self, options: CookieOptions) -> Self {
        self.config.defaults = options;
        self
    }

    pub fn consent(mut self, consent: ConsentConfig) -> Self {
        self.config.consent = consent;
        self
    }

    /// Shorthand for turning consent gating off.
    pub fn consent_enabled(mut self, enabled: bool) -> Self {
        self.config.consent.enabled = enabled;
        self
    }

    pub fn backup(mut self, backup: BackupConfig) -> Self {
        self.config.backup = backup;
        self
    }

    pub fn max_backups(mut self, count: usize) -> Self {
        self.config.backup.max_backups = count;
        self
    }

    pub fn expiration(mut self, expiration: ExpirationConfig) -> Self {
        self.config.expiration = expiration;
        self
    }

    /// Seconds of remaining lifetime below which a cookie is expiring soon.
    pub fn warning_threshold(mut self, seconds: i64) -> Self {
        self.config.expiration.warning_threshold = seconds;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<CookieConfig, CookieError> {
        self.config.finish()
    }
}
