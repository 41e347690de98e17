//! Consent-gated cookie writes.
//!
//! Every configured cookie belongs to a [`Category`]. Writes to anything
//! but [`Category::Necessary`] need a stored [`ConsentRecord`] granting
//! that category. Withdrawing a category purges its cookies, including
//! their backup history and expiry records.

use crate::base::context::JsonResultExt;
use crate::base::error::CookieError;
use crate::config::CookieConfig;
use crate::store::{CookieOptions, CookieStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;

/// Consent category of a cookie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Always allowed. Cannot be withdrawn.
    #[default]
    Necessary,
    Functional,
    Analytics,
    Marketing,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Necessary,
        Category::Functional,
        Category::Analytics,
        Category::Marketing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Necessary => "necessary",
            Category::Functional => "functional",
            Category::Analytics => "analytics",
            Category::Marketing => "marketing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories the user agreed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentChoices {
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
}

impl ConsentChoices {
    pub fn all() -> Self {
        Self {
            functional: true,
            analytics: true,
            marketing: true,
        }
    }

    pub fn necessary_only() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, granted: bool) -> Self {
        match category {
            Category::Necessary => {}
            Category::Functional => self.functional = granted,
            Category::Analytics => self.analytics = granted,
            Category::Marketing => self.marketing = granted,
        }
        self
    }
}

/// Stored consent state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub necessary: bool,
    pub functional: bool,
    pub analytics: bool,
    pub marketing: bool,
    pub version: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ConsentRecord {
    pub fn new(choices: ConsentChoices, version: u32, updated_at: OffsetDateTime) -> Self {
        Self {
            necessary: true,
            functional: choices.functional,
            analytics: choices.analytics,
            marketing: choices.marketing,
            version,
            updated_at,
        }
    }

    pub fn grants(&self, category: Category) -> bool {
        match category {
            Category::Necessary => true,
            Category::Functional => self.functional,
            Category::Analytics => self.analytics,
            Category::Marketing => self.marketing,
        }
    }

    pub fn choices(&self) -> ConsentChoices {
        ConsentChoices {
            functional: self.functional,
            analytics: self.analytics,
            marketing: self.marketing,
        }
    }

    pub fn granted(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.grants(*c))
            .collect()
    }
}

/// Result of a consent change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentUpdate {
    pub record: ConsentRecord,
    /// Cookies removed because their category is no longer granted.
    pub purged: Vec<String>,
}

/// Consent layer over a [`CookieStore`].
pub struct ConsentManager<S> {
    store: Arc<S>,
    config: Arc<CookieConfig>,
}

impl<S> Clone for ConsentManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: CookieStore> ConsentManager<S> {
    pub fn new(store: Arc<S>, config: Arc<CookieConfig>) -> Self {
        Self { store, config }
    }

    /// Stored record for the current policy version.
    ///
    /// Unreadable records and records for another version count as absent.
    pub fn consent(&self) -> Option<ConsentRecord> {
        let name = &self.config.consent.cookie_name;
        let raw = self.store.get(name)?;

        let record: ConsentRecord = match serde_json::from_str(&raw).cookie_context(name) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable consent record");
                return None;
            }
        };

        if record.version != self.config.consent.version {
            tracing::debug!(
                stored = record.version,
                current = self.config.consent.version,
                "consent record is for another policy version"
            );
            return None;
        }

        Some(record)
    }

    pub fn has_consent(&self) -> bool {
        self.consent().is_some()
    }

    pub fn is_allowed(&self, category: Category) -> bool {
        if category == Category::Necessary || !self.config.consent.enabled {
            return true;
        }
        self.consent().is_some_and(|r| r.grants(category))
    }

    /// Whether the configured cookie `name` may be written right now.
    pub fn can_write(&self, name: &str) -> Result<bool, CookieError> {
        let def = self.config.require(name)?;
        Ok(self.is_allowed(def.category))
    }

    /// `Ok(())` when `name` may be written, `ConsentRequired` otherwise.
    pub fn check_write(&self, name: &str) -> Result<(), CookieError> {
        let def = self.config.require(name)?;
        if self.is_allowed(def.category) {
            return Ok(());
        }

        tracing::warn!(name = %name, category = %def.category, "cookie write blocked by consent");
        Err(CookieError::ConsentRequired {
            name: name.to_string(),
            category: def.category,
        })
    }

    /// Store new choices and purge every category that is not granted.
    pub fn update_consent(&self, choices: ConsentChoices) -> Result<ConsentUpdate, CookieError> {
        let record = ConsentRecord::new(
            choices,
            self.config.consent.version,
            OffsetDateTime::now_utc(),
        );
        self.write_record(&record)?;

        let purged = Category::ALL
            .into_iter()
            .filter(|c| !record.grants(*c))
            .flat_map(|c| self.purge_category(c))
            .collect::<Vec<_>>();

        tracing::debug!(
            functional = record.functional,
            analytics = record.analytics,
            marketing = record.marketing,
            purged = purged.len(),
            "consent updated"
        );

        Ok(ConsentUpdate { record, purged })
    }

    pub fn accept_all(&self) -> Result<ConsentUpdate, CookieError> {
        self.update_consent(ConsentChoices::all())
    }

    pub fn reject_all(&self) -> Result<ConsentUpdate, CookieError> {
        self.update_consent(ConsentChoices::necessary_only())
    }

    /// Withdraw one category, keeping the other choices.
    pub fn withdraw(&self, category: Category) -> Result<ConsentUpdate, CookieError> {
        let current = self
            .consent()
            .map(|r| r.choices())
            .unwrap_or_default();
        self.update_consent(current.with(category, false))
    }

    /// Forget the stored record and purge every non-necessary cookie.
    pub fn revoke(&self) -> Vec<String> {
        let scope = self.config.defaults.scope();
        self.store.delete(&self.config.consent.cookie_name, &scope);

        Category::ALL
            .into_iter()
            .filter(|c| *c != Category::Necessary)
            .flat_map(|c| self.purge_category(c))
            .collect()
    }

    /// Delete every configured cookie of `category` with its derived keys.
    ///
    /// Returns the names that held a live value.
    pub fn purge_category(&self, category: Category) -> Vec<String> {
        let mut purged = Vec::new();

        for def in self.config.in_category(category) {
            let scope = self.config.options_for(def).scope();
            let had_value = self.store.contains(&def.name);

            self.store.delete(&def.name, &scope);
            self.store.delete(&self.config.backup_key(&def.name), &scope);
            self.store.delete(&self.config.expiry_key(&def.name), &scope);

            if had_value {
                tracing::debug!(name = %def.name, category = %category, "purged cookie");
                purged.push(def.name.clone());
            }
        }

        purged
    }

    fn write_record(&self, record: &ConsentRecord) -> Result<(), CookieError> {
        let name = &self.config.consent.cookie_name;
        let json = serde_json::to_string(record).cookie_context(name)?;
        let options = self
            .config
            .defaults
            .merge(&CookieOptions::new().max_age(self.config.consent.max_age));
        self.store.set(name, &json, &options)
    }
}
