//! Backup history and recovery for critical cookies.
//!
//! Each write of a critical cookie appends a [`Snapshot`] to a bounded
//! history stored as JSON under `<backup prefix><name>`. Recovery restores
//! the newest snapshot as the live value.
//!
//! The checksum is an additive byte sum. It catches truncation and
//! accidental edits, not tampering.

use crate::base::context::JsonResultExt;
use crate::base::error::CookieError;
use crate::config::CookieConfig;
use crate::store::{CookieOptions, CookieStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;

/// Wrapping sum of the value's bytes.
pub fn checksum(value: &str) -> u32 {
    value
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_add(u32::from(b)))
}

/// One saved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Encoded value as it was written to the store.
    pub value: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub checksum: u32,
}

impl Snapshot {
    pub fn new(value: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        let value = value.into();
        let checksum = checksum(&value);
        Self {
            value,
            timestamp,
            checksum,
        }
    }

    pub fn is_valid(&self) -> bool {
        checksum(&self.value) == self.checksum
    }
}

/// Options for [`BackupManager::recover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverOptions {
    pub verify_checksum: bool,
}

impl RecoverOptions {
    pub fn verified() -> Self {
        Self {
            verify_checksum: true,
        }
    }

    pub fn unverified() -> Self {
        Self {
            verify_checksum: false,
        }
    }
}

/// Backup layer over a [`CookieStore`].
pub struct BackupManager<S> {
    store: Arc<S>,
    config: Arc<CookieConfig>,
}

impl<S> Clone for BackupManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: CookieStore> BackupManager<S> {
    pub fn new(store: Arc<S>, config: Arc<CookieConfig>) -> Self {
        Self { store, config }
    }

    /// Default recovery options from config.
    pub fn default_options(&self) -> RecoverOptions {
        RecoverOptions {
            verify_checksum: self.config.backup.verify_checksum,
        }
    }

    /// Append a snapshot of `encoded` to the history of `name`.
    ///
    /// Oldest snapshots are dropped to respect both the configured depth
    /// and the size limit. Returns the number of snapshots kept.
    pub fn backup(
        &self,
        name: &str,
        encoded: &str,
        now: OffsetDateTime,
    ) -> Result<usize, CookieError> {
        self.config.require(name)?;
        let key = self.config.backup_key(name);

        let mut history = self.history(name);
        history.push(Snapshot::new(encoded, now));

        let excess = history.len().saturating_sub(self.config.backup.max_backups);
        history.drain(..excess);

        let json = loop {
            let json = serde_json::to_string(&history).cookie_context(&key)?;
            if key.len() + json.len() <= self.config.max_size {
                break json;
            }
            if history.len() <= 1 {
                return Err(CookieError::ValueTooLarge {
                    name: key,
                    size: json.len(),
                    max: self.config.max_size,
                });
            }
            history.remove(0);
        };

        self.store.set(&key, &json, &self.history_options(name))?;
        tracing::debug!(name = %name, depth = history.len(), "cookie backed up");
        Ok(history.len())
    }

    /// Snapshots for `name`, oldest first. Unreadable history reads as empty.
    pub fn history(&self, name: &str) -> Vec<Snapshot> {
        let key = self.config.backup_key(name);
        let Some(raw) = self.store.get(&key) else {
            return Vec::new();
        };

        match serde_json::from_str(&raw).cookie_context(&key) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "discarding unreadable backup history");
                Vec::new()
            }
        }
    }

    pub fn latest(&self, name: &str) -> Option<Snapshot> {
        self.history(name).pop()
    }

    /// Whether the newest snapshot passes its checksum.
    pub fn verify(&self, name: &str) -> Result<bool, CookieError> {
        self.latest(name)
            .map(|s| s.is_valid())
            .ok_or_else(|| CookieError::NoBackup {
                name: name.to_string(),
            })
    }

    /// Restore the newest snapshot as the live value of `name`.
    pub fn recover(&self, name: &str, options: RecoverOptions) -> Result<String, CookieError> {
        let def = self.config.require(name)?;
        let snapshot = self.latest(name).ok_or_else(|| CookieError::NoBackup {
            name: name.to_string(),
        })?;

        if options.verify_checksum {
            let actual = checksum(&snapshot.value);
            if actual != snapshot.checksum {
                tracing::warn!(name = %name, "backup checksum mismatch");
                return Err(CookieError::ChecksumMismatch {
                    name: name.to_string(),
                    expected: snapshot.checksum,
                    actual,
                });
            }
        }

        self.store
            .set(name, &snapshot.value, &self.config.options_for(def))?;
        tracing::debug!(name = %name, taken_at = %snapshot.timestamp, "cookie recovered from backup");
        Ok(snapshot.value)
    }

    /// Drop the whole history of `name`.
    pub fn clear(&self, name: &str) {
        self.store
            .delete(&self.config.backup_key(name), &self.scope(name));
    }

    fn scope(&self, name: &str) -> CookieOptions {
        self.config
            .definition(name)
            .map(|def| self.config.options_for(def).scope())
            .unwrap_or_else(|| self.config.defaults.scope())
    }

    /// The cookie's scope with the backup lifetime, not the cookie's own.
    fn history_options(&self, name: &str) -> CookieOptions {
        let mut options = self.scope(name);
        options.max_age = Some(self.config.backup.max_age);
        self.config.defaults.merge(&options)
    }
}
