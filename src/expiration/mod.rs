//! Expiration bookkeeping.
//!
//! Request cookies carry no attributes, so the expiry a cookie was written
//! with is recorded next to it as an [`ExpiryRecord`] under
//! `<expiry prefix><name>`. Classification works from those records.

use crate::base::context::JsonResultExt;
use crate::base::error::CookieError;
use crate::config::CookieConfig;
use crate::store::{CookieOptions, CookieStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// Longest lifetime a cookie can be given, as browsers cap it (RFC 6265bis).
pub const MAX_LIFETIME: Duration = Duration::days(400);

/// Expiry implied by `options` for a write at `now`.
///
/// `max_age` wins over `expires`. Neither means a session cookie. The
/// result never lies more than [`MAX_LIFETIME`] after `now`.
pub fn compute_expiry(options: &CookieOptions, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let cap = now + MAX_LIFETIME;
    match (options.max_age, options.expires) {
        (Some(max_age), _) => {
            let secs = max_age.clamp(0, MAX_LIFETIME.whole_seconds());
            Some(now + Duration::seconds(secs))
        }
        (None, Some(expires)) => Some(expires.min(cap)),
        (None, None) => None,
    }
}

/// When a cookie was written and when it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryRecord {
    #[serde(with = "time::serde::timestamp")]
    pub set_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl ExpiryRecord {
    pub fn new(options: &CookieOptions, now: OffsetDateTime) -> Self {
        Self {
            set_at: now,
            expires_at: compute_expiry(options, now),
        }
    }

    /// Classify against `now` with the given warning threshold.
    pub fn status(&self, now: OffsetDateTime, threshold: Duration) -> ExpirationStatus {
        let Some(expires_at) = self.expires_at else {
            return ExpirationStatus::Session;
        };

        let remaining = expires_at - now;
        if remaining <= Duration::ZERO {
            ExpirationStatus::Expired
        } else if remaining <= threshold {
            ExpirationStatus::ExpiringSoon { remaining }
        } else {
            ExpirationStatus::Active { remaining }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationStatus {
    /// No expiry; lives until the browser session ends.
    Session,
    Active { remaining: Duration },
    ExpiringSoon { remaining: Duration },
    Expired,
}

impl ExpirationStatus {
    pub fn is_expired(&self) -> bool {
        matches!(self, ExpirationStatus::Expired)
    }

    pub fn is_expiring_soon(&self) -> bool {
        matches!(self, ExpirationStatus::ExpiringSoon { .. })
    }
}

/// One line of [`ExpirationManager::report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationEntry {
    pub name: String,
    pub record: ExpiryRecord,
    pub status: ExpirationStatus,
}

/// Expiration layer over a [`CookieStore`].
pub struct ExpirationManager<S> {
    store: Arc<S>,
    config: Arc<CookieConfig>,
}

impl<S> Clone for ExpirationManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: CookieStore> ExpirationManager<S> {
    pub fn new(store: Arc<S>, config: Arc<CookieConfig>) -> Self {
        Self { store, config }
    }

    pub fn threshold(&self) -> Duration {
        Duration::seconds(self.config.expiration.warning_threshold)
    }

    /// Record a write of `name` made with `options` at `now`.
    pub fn track(
        &self,
        name: &str,
        options: &CookieOptions,
        now: OffsetDateTime,
    ) -> Result<ExpiryRecord, CookieError> {
        let record = ExpiryRecord::new(options, now);
        self.write_record(name, &record)?;
        Ok(record)
    }

    pub fn record(&self, name: &str) -> Option<ExpiryRecord> {
        let key = self.config.expiry_key(name);
        let raw = self.store.get(&key)?;

        match serde_json::from_str(&raw).cookie_context(&key) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "ignoring unreadable expiry record");
                None
            }
        }
    }

    /// Status of `name`, or `None` when it is not tracked.
    pub fn status(&self, name: &str, now: OffsetDateTime) -> Option<ExpirationStatus> {
        self.record(name).map(|r| r.status(now, self.threshold()))
    }

    /// Every tracked configured cookie with its status.
    pub fn report(&self, now: OffsetDateTime) -> Vec<ExpirationEntry> {
        let threshold = self.threshold();
        self.config
            .names()
            .filter_map(|name| {
                self.record(name).map(|record| ExpirationEntry {
                    name: name.to_string(),
                    record,
                    status: record.status(now, threshold),
                })
            })
            .collect()
    }

    pub fn expired(&self, now: OffsetDateTime) -> Vec<String> {
        self.report(now)
            .into_iter()
            .filter(|e| e.status.is_expired())
            .map(|e| e.name)
            .collect()
    }

    pub fn expiring_soon(&self, now: OffsetDateTime) -> Vec<String> {
        self.report(now)
            .into_iter()
            .filter(|e| e.status.is_expiring_soon())
            .map(|e| e.name)
            .collect()
    }

    /// Push the expiry of a live cookie `by` further out.
    ///
    /// The new expiry is counted from the current one, or from `now` if the
    /// cookie is a session cookie or already past its expiry. It is capped
    /// at [`MAX_LIFETIME`] from `now`. A zero or negative `by` is rejected.
    pub fn extend(
        &self,
        name: &str,
        by: Duration,
        now: OffsetDateTime,
    ) -> Result<OffsetDateTime, CookieError> {
        let def = self.config.require(name)?;
        if by <= Duration::ZERO {
            return Err(CookieError::InvalidLifetime {
                name: name.to_string(),
                seconds: by.whole_seconds(),
            });
        }
        let value = self
            .store
            .get(name)
            .ok_or_else(|| CookieError::not_found(name))?;

        let base = self
            .record(name)
            .and_then(|r| r.expires_at)
            .filter(|at| *at > now)
            .unwrap_or(now);
        let cap = now + MAX_LIFETIME;
        let new_expiry = base.checked_add(by).map_or(cap, |at| at.min(cap));

        let mut options = self.config.options_for(def);
        options.expires = None;
        options.max_age = Some((new_expiry - now).whole_seconds());

        self.store.set(name, &value, &options)?;
        self.write_record(
            name,
            &ExpiryRecord {
                set_at: now,
                expires_at: Some(new_expiry),
            },
        )?;

        tracing::debug!(name = %name, expires_at = %new_expiry, "cookie expiry extended");
        Ok(new_expiry)
    }

    /// Delete every expired cookie and its record. Backups are kept.
    pub fn cleanup_expired(&self, now: OffsetDateTime) -> Vec<String> {
        let expired = self.expired(now);
        for name in &expired {
            self.remove(name);
            tracing::debug!(name = %name, "removed expired cookie");
        }
        expired
    }

    /// Delete the live value and expiry record of `name`.
    pub fn remove(&self, name: &str) {
        let scope = self.scope(name);
        self.store.delete(name, &scope);
        self.store.delete(&self.config.expiry_key(name), &scope);
    }

    /// Delete only the expiry record of `name`.
    pub fn forget(&self, name: &str) {
        let scope = self.scope(name);
        self.store.delete(&self.config.expiry_key(name), &scope);
    }

    fn scope(&self, name: &str) -> CookieOptions {
        self.config
            .definition(name)
            .map(|def| self.config.options_for(def).scope())
            .unwrap_or_else(|| self.config.defaults.scope())
    }

    fn write_record(&self, name: &str, record: &ExpiryRecord) -> Result<(), CookieError> {
        let key = self.config.expiry_key(name);
        let json = serde_json::to_string(record).cookie_context(&key)?;

        let mut options = self.scope(name);
        options.max_age = Some(self.config.expiration.record_max_age);
        self.store.set(&key, &json, &self.config.defaults.merge(&options))
    }
}
