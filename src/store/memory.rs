use crate::base::error::CookieError;
use crate::expiration::compute_expiry;
use crate::store::{CookieOptions, CookieStore};
use dashmap::DashMap;
use std::sync::Arc;
use time::OffsetDateTime;

/// A cookie held by [`MemoryCookieStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub value: String,
    pub options: CookieOptions,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
}

impl StoredCookie {
    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        self.expiration_time
            .is_some_and(|expiry| expiry <= current_time)
    }
}

/// In-memory cookie store that behaves like a browser jar for one origin.
///
/// Expired cookies read as absent and are dropped lazily. Nothing is
/// evicted for capacity, so the consent record and the `__backup_`/`__exp_`
/// keys stay until they expire or are deleted.
#[derive(Clone, Default)]
pub struct MemoryCookieStore {
    store: Arc<DashMap<String, StoredCookie>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full record of a live cookie, including its attributes.
    pub fn cookie(&self, name: &str) -> Option<StoredCookie> {
        let now = OffsetDateTime::now_utc();
        self.store
            .get(name)
            .filter(|c| !c.is_expired(now))
            .map(|c| c.clone())
    }

    /// Number of live cookies.
    pub fn len(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        self.store.iter().filter(|c| !c.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Drop expired entries.
    fn purge_expired(&self, now: OffsetDateTime) {
        self.store.retain(|name, c| {
            let keep = !c.is_expired(now);
            if !keep {
                tracing::debug!(name = %name, "dropping expired cookie");
            }
            keep
        });
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let now = OffsetDateTime::now_utc();
        let expired = match self.store.get(name) {
            Some(cookie) if !cookie.is_expired(now) => return Some(cookie.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.store.remove(name);
        }
        None
    }

    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<(), CookieError> {
        if name.is_empty() {
            return Err(CookieError::store("cookie name must not be empty"));
        }

        let now = OffsetDateTime::now_utc();
        let cookie = StoredCookie {
            value: value.to_string(),
            options: options.clone(),
            creation_time: now,
            expiration_time: compute_expiry(options, now),
        };

        // An already-expired write behaves like a delete.
        if cookie.is_expired(now) {
            self.store.remove(name);
            return Ok(());
        }

        self.purge_expired(now);
        self.store.insert(name.to_string(), cookie);
        Ok(())
    }

    fn delete(&self, name: &str, _options: &CookieOptions) {
        self.store.remove(name);
    }

    fn names(&self) -> Vec<String> {
        let now = OffsetDateTime::now_utc();
        let mut names: Vec<String> = self
            .store
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}
