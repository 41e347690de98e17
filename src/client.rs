//! Typed cookie client.
//!
//! Composes the serialization, consent, backup and expiration layers over
//! one [`CookieStore`] and one [`CookieConfig`].
//!
//! # Example
//!
//! ```rust
//! use cookieguard::{CookieClient, CookieConfig, CookieDefinition};
//! use cookieguard::consent::Category;
//! use cookieguard::store::MemoryCookieStore;
//!
//! let config = CookieConfig::builder()
//!     .cookie(CookieDefinition::new("session").critical(true))
//!     .cookie(CookieDefinition::new("theme").one_of(["light", "dark"]).category(Category::Functional))
//!     .build()?;
//! let client = CookieClient::new(MemoryCookieStore::new(), config);
//!
//! client.set("session", "abc123")?;
//! assert!(client.set("theme", "dark").is_err()); // no consent yet
//!
//! client.consent().accept_all()?;
//! client.set("theme", "dark")?;
//! assert_eq!(client.get("theme")?.unwrap().as_text(), Some("dark"));
//! # Ok::<(), cookieguard::CookieError>(())
//! ```

use crate::backup::{BackupManager, RecoverOptions};
use crate::base::error::CookieError;
use crate::codec::{self, CookieValue};
use crate::config::CookieConfig;
use crate::consent::ConsentManager;
use crate::expiration::ExpirationManager;
use crate::store::{CookieOptions, CookieStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// Policy-enforcing client over a cookie store.
pub struct CookieClient<S> {
    store: Arc<S>,
    config: Arc<CookieConfig>,
    consent: ConsentManager<S>,
    backups: BackupManager<S>,
    expiration: ExpirationManager<S>,
}

impl<S> Clone for CookieClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            consent: self.consent.clone(),
            backups: self.backups.clone(),
            expiration: self.expiration.clone(),
        }
    }
}

impl<S: CookieStore> CookieClient<S> {
    pub fn new(store: S, config: CookieConfig) -> Self {
        Self::with_shared(Arc::new(store), Arc::new(config))
    }

    /// Build a client over an already shared store and config.
    pub fn with_shared(store: Arc<S>, config: Arc<CookieConfig>) -> Self {
        Self {
            consent: ConsentManager::new(Arc::clone(&store), Arc::clone(&config)),
            backups: BackupManager::new(Arc::clone(&store), Arc::clone(&config)),
            expiration: ExpirationManager::new(Arc::clone(&store), Arc::clone(&config)),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    pub fn consent(&self) -> &ConsentManager<S> {
        &self.consent
    }

    pub fn backups(&self) -> &BackupManager<S> {
        &self.backups
    }

    pub fn expiration(&self) -> &ExpirationManager<S> {
        &self.expiration
    }

    /// Read a configured cookie.
    ///
    /// A cookie whose expiry record has lapsed reads as absent and is
    /// removed.
    pub fn get(&self, name: &str) -> Result<Option<CookieValue>, CookieError> {
        self.config.require(name)?;

        let now = OffsetDateTime::now_utc();
        if self
            .expiration
            .status(name, now)
            .is_some_and(|s| s.is_expired())
        {
            tracing::debug!(name = %name, "dropping expired cookie on read");
            self.expiration.remove(name);
            return Ok(None);
        }

        Ok(self.store.get(name).map(|raw| codec::decode(&raw)))
    }

    /// Read a configured cookie into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, CookieError> {
        self.get(name)?.map(|v| v.deserialize(name)).transpose()
    }

    /// Read several cookies at once. Any unknown name fails the call.
    pub fn get_multiple(
        &self,
        names: &[&str],
    ) -> Result<BTreeMap<String, Option<CookieValue>>, CookieError> {
        for name in names {
            self.config.require(name)?;
        }

        names
            .iter()
            .map(|name| self.get(name).map(|value| (name.to_string(), value)))
            .collect()
    }

    /// Write a configured cookie with its configured options.
    pub fn set(&self, name: &str, value: impl Into<CookieValue>) -> Result<(), CookieError> {
        self.set_with(name, value, &CookieOptions::default())
    }

    /// Serialize `value` to JSON and write it.
    pub fn set_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), CookieError> {
        let value = CookieValue::from_serialize(name, value)?;
        self.set(name, value)
    }

    /// Write a configured cookie, overlaying `overrides` on its options.
    ///
    /// The value is validated against the schema, checked for consent and
    /// size, then written. The expiry is recorded and critical cookies are
    /// backed up. Bookkeeping failures are logged and do not fail the write.
    pub fn set_with(
        &self,
        name: &str,
        value: impl Into<CookieValue>,
        overrides: &CookieOptions,
    ) -> Result<(), CookieError> {
        let value = value.into();
        let def = self.config.require(name)?;

        codec::validate(def, &value)?;
        self.consent.check_write(name)?;
        let encoded = codec::encode(name, &value, self.config.max_size)?;

        let options = self.config.options_for(def).merge(overrides);
        self.store.set(name, &encoded, &options)?;

        let now = OffsetDateTime::now_utc();
        if let Err(e) = self.expiration.track(name, &options, now) {
            tracing::warn!(name = %name, error = %e, "failed to record cookie expiry");
        }
        if def.critical {
            if let Err(e) = self.backups.backup(name, &encoded, now) {
                tracing::warn!(name = %name, error = %e, "failed to back up critical cookie");
            }
        }

        tracing::debug!(name = %name, bytes = encoded.len(), "cookie set");
        Ok(())
    }

    /// Remove the live value and expiry record. Backups are kept.
    pub fn delete(&self, name: &str) -> Result<(), CookieError> {
        self.config.require(name)?;
        self.expiration.remove(name);
        tracing::debug!(name = %name, "cookie deleted");
        Ok(())
    }

    /// Whether `name` is configured and holds a live, unexpired value.
    pub fn has(&self, name: &str) -> bool {
        matches!(self.get(name), Ok(Some(_)))
    }

    /// Delete every configured cookie with its backups and expiry record.
    ///
    /// Returns the names that held a value. The consent record is kept.
    pub fn clear_all(&self) -> Vec<String> {
        let mut cleared = Vec::new();

        for def in self.config.definitions() {
            if self.store.contains(&def.name) {
                cleared.push(def.name.clone());
            }
            self.expiration.remove(&def.name);
            self.backups.clear(&def.name);
        }

        tracing::debug!(count = cleared.len(), "cleared all cookies");
        cleared
    }

    /// Restore `name` from its newest backup using the configured
    /// checksum policy.
    pub fn recover(&self, name: &str) -> Result<CookieValue, CookieError> {
        self.recover_with(name, self.backups.default_options())
    }

    pub fn recover_with(
        &self,
        name: &str,
        options: RecoverOptions,
    ) -> Result<CookieValue, CookieError> {
        let def = self.config.require(name)?;
        self.consent.check_write(name)?;

        let restored = self.backups.recover(name, options)?;
        let cookie_options = self.config.options_for(def);
        if let Err(e) = self
            .expiration
            .track(name, &cookie_options, OffsetDateTime::now_utc())
        {
            tracing::warn!(name = %name, error = %e, "failed to record cookie expiry");
        }

        Ok(codec::decode(&restored))
    }

    /// Extend the expiry of `name` by `by` from its current expiry.
    pub fn extend(&self, name: &str, by: Duration) -> Result<OffsetDateTime, CookieError> {
        self.expiration.extend(name, by, OffsetDateTime::now_utc())
    }

    /// Remove expired cookies. Returns their names.
    pub fn cleanup_expired(&self) -> Vec<String> {
        self.expiration.cleanup_expired(OffsetDateTime::now_utc())
    }

    /// Configured cookies expiring within the warning threshold.
    pub fn expiring_soon(&self) -> Vec<String> {
        self.expiration.expiring_soon(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CookieDefinition;
    use crate::consent::Category;
    use crate::store::MemoryCookieStore;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Cart {
        items: Vec<String>,
    }

    fn client() -> CookieClient<MemoryCookieStore> {
        let config = CookieConfig::builder()
            .cookie(CookieDefinition::new("session").critical(true))
            .cookie(
                CookieDefinition::new("theme")
                    .one_of(["light", "dark"])
                    .category(Category::Functional),
            )
            .cookie(CookieDefinition::new("cart").json())
            .cookie(CookieDefinition::new("count"))
            .cookie(CookieDefinition::new("_ga").category(Category::Analytics))
            .max_size(256)
            .build()
            .unwrap();
        CookieClient::new(MemoryCookieStore::new(), config)
    }

    #[test]
    fn test_set_and_get_text() {
        let client = client();
        client.set("session", "abc").unwrap();
        assert_eq!(client.get("session").unwrap(), Some(CookieValue::from("abc")));
        assert!(client.has("session"));
    }

    #[test]
    fn test_unknown_cookie() {
        let client = client();
        assert_eq!(
            client.set("nope", "x").unwrap_err(),
            CookieError::unknown_cookie("nope")
        );
        assert!(client.get("nope").is_err());
        assert!(!client.has("nope"));
    }

    #[test]
    fn test_schema_checked_before_consent() {
        let client = client();
        assert!(matches!(
            client.set("theme", "blue"),
            Err(CookieError::InvalidValue { .. })
        ));
        assert!(matches!(
            client.set("theme", "dark"),
            Err(CookieError::ConsentRequired { .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let client = client();
        let cart = Cart {
            items: vec!["a".into(), "b".into()],
        };
        client.set_json("cart", &cart).unwrap();
        assert_eq!(client.get_as::<Cart>("cart").unwrap(), Some(cart));
        assert!(client.set("cart", "plain").is_err());
    }

    #[test]
    fn test_scalar_json_round_trip() {
        let client = client();
        client.set_json("count", &42u32).unwrap();
        assert_eq!(client.get_as::<u32>("count").unwrap(), Some(42));

        assert_eq!(
            client.set_json("cart", &42u32).unwrap_err(),
            CookieError::ExpectedJson {
                name: "cart".into()
            }
        );
        assert!(client.set("cart", json!(null)).is_err());
    }

    #[test]
    fn test_oversized_lifetime_is_capped() {
        let client = client();
        client
            .set_with("session", "abc", &CookieOptions::new().max_age(i64::MAX))
            .unwrap();

        assert!(client.has("session"));
        let record = client.expiration().record("session").unwrap();
        let lifetime = record.expires_at.unwrap() - record.set_at;
        assert!(lifetime <= crate::expiration::MAX_LIFETIME);
    }

    #[test]
    fn test_size_limit() {
        let client = client();
        let err = client.set("session", "x".repeat(300)).unwrap_err();
        assert!(matches!(err, CookieError::ValueTooLarge { .. }));
        assert!(!client.has("session"));
    }

    #[test]
    fn test_get_multiple() {
        let client = client();
        client.set("session", "s").unwrap();
        client.set("cart", json!({"items": []})).unwrap();

        let values = client.get_multiple(&["session", "cart", "theme"]).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values["session"], Some(CookieValue::from("s")));
        assert!(values["cart"].as_ref().unwrap().is_json());
        assert_eq!(values["theme"], None);

        assert!(client.get_multiple(&["session", "bogus"]).is_err());
    }

    #[test]
    fn test_critical_write_is_backed_up() {
        let client = client();
        client.set("session", "one").unwrap();
        client.set("session", "two").unwrap();

        let history = client.backups().history("session");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].value, "two");
        assert!(client.backups().history("cart").is_empty());
    }

    #[test]
    fn test_delete_then_recover() {
        let client = client();
        client.set("session", "abc").unwrap();
        client.delete("session").unwrap();
        assert!(!client.has("session"));

        assert_eq!(client.recover("session").unwrap(), CookieValue::from("abc"));
        assert_eq!(client.get("session").unwrap(), Some(CookieValue::from("abc")));
        assert!(client.expiration().record("session").is_some());
    }

    #[test]
    fn test_expired_record_reads_absent() {
        let client = client();
        client
            .set_with("session", "abc", &CookieOptions::new().max_age(3600))
            .unwrap();

        // Simulate the recorded lifetime having lapsed.
        let past = OffsetDateTime::now_utc() - Duration::hours(2);
        client
            .expiration()
            .track("session", &CookieOptions::new().max_age(60), past)
            .unwrap();

        assert_eq!(client.get("session").unwrap(), None);
        assert!(client.store().get("session").is_none());
        assert!(client.expiration().record("session").is_none());
    }

    #[test]
    fn test_clear_all_keeps_consent() {
        let client = client();
        client.consent().accept_all().unwrap();
        client.set("session", "s").unwrap();
        client.set("theme", "light").unwrap();

        let mut cleared = client.clear_all();
        cleared.sort();
        assert_eq!(cleared, vec!["session".to_string(), "theme".to_string()]);
        assert!(client.backups().history("session").is_empty());
        assert!(client.consent().has_consent());
        assert_eq!(client.store().names(), vec!["cookie_consent".to_string()]);
    }
}
