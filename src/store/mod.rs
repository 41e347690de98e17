//! Key-value cookie primitive.
//!
//! The policy layers never talk HTTP. They read and write plain strings by
//! name through the [`CookieStore`] trait and hand the transport attributes
//! in [`CookieOptions`] to the store unchanged.
//!
//! | Store | Backing | Use |
//! |-------|---------|-----|
//! | [`MemoryCookieStore`](memory::MemoryCookieStore) | `DashMap` | Tests, hosts without a framework store |
//! | [`JarCookieStore`](jar::JarCookieStore) | `cookie::CookieJar` | Per-request store fed from the `Cookie` header |

pub mod jar;
pub mod memory;

use crate::base::error::CookieError;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use jar::JarCookieStore;
pub use memory::MemoryCookieStore;

/// A per-request cookie store supplied by the host framework.
pub trait CookieStore: Send + Sync {
    /// Raw value of a live cookie, or `None` when absent.
    fn get(&self, name: &str) -> Option<String>;

    /// Write a cookie with the given transport attributes.
    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<(), CookieError>;

    /// Remove a cookie. Path and domain must match the ones it was set with.
    fn delete(&self, name: &str, options: &CookieOptions);

    /// Names of all live cookies.
    fn names(&self) -> Vec<String>;

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// SameSite attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

/// Transport attributes for a cookie write.
///
/// Every field is optional so that per-cookie and per-call options can be
/// layered over configured defaults with [`CookieOptions::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
    pub same_site: Option<SameSite>,
    /// Lifetime in seconds from the time of the write.
    pub max_age: Option<i64>,
    /// Absolute expiry. `max_age` takes precedence when both are set.
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires: Option<OffsetDateTime>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn expires(mut self, at: OffsetDateTime) -> Self {
        self.expires = Some(at);
        self
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    ///
    /// An explicit lifetime in `other` replaces both lifetime fields of
    /// `self`, so a per-call `expires` is not shadowed by a configured
    /// `max_age`.
    pub fn merge(&self, other: &CookieOptions) -> CookieOptions {
        let (max_age, expires) = if other.max_age.is_some() || other.expires.is_some() {
            (other.max_age, other.expires)
        } else {
            (self.max_age, self.expires)
        };

        CookieOptions {
            path: other.path.clone().or_else(|| self.path.clone()),
            domain: other.domain.clone().or_else(|| self.domain.clone()),
            secure: other.secure.or(self.secure),
            http_only: other.http_only.or(self.http_only),
            same_site: other.same_site.or(self.same_site),
            max_age,
            expires,
        }
    }

    /// Only the attributes that identify a cookie for removal.
    pub fn scope(&self) -> CookieOptions {
        CookieOptions {
            path: self.path.clone(),
            domain: self.domain.clone(),
            ..CookieOptions::default()
        }
    }
}
