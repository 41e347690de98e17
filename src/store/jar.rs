//! Per-request store over the `cookie` crate's [`CookieJar`].
//!
//! Seed it from the request `Cookie` header, let the policy layer read and
//! write through it, then emit the `Set-Cookie` headers for the response.
//!
//! ```rust
//! use cookieguard::store::{CookieOptions, CookieStore, JarCookieStore};
//!
//! let jar = JarCookieStore::from_header("theme=dark; lang=en");
//! assert_eq!(jar.get("theme").as_deref(), Some("dark"));
//!
//! jar.set("theme", "light", &CookieOptions::new().path("/")).unwrap();
//! let headers = jar.set_cookie_headers().unwrap();
//! assert_eq!(headers.len(), 1);
//! ```

use crate::base::error::CookieError;
use crate::expiration::compute_expiry;
use crate::store::{CookieOptions, CookieStore};
use cookie::{Cookie, CookieJar};
use http::HeaderValue;
use std::sync::{Mutex, MutexGuard};
use time::{Duration, OffsetDateTime};

/// [`CookieStore`] adapter for a `cookie::CookieJar`.
#[derive(Default)]
pub struct JarCookieStore {
    jar: Mutex<CookieJar>,
}

impl JarCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing jar.
    pub fn from_jar(jar: CookieJar) -> Self {
        Self {
            jar: Mutex::new(jar),
        }
    }

    /// Build a jar from a request `Cookie` header. Malformed pairs are skipped.
    pub fn from_header(header: &str) -> Self {
        let mut jar = CookieJar::new();
        for parsed in Cookie::split_parse_encoded(header.to_owned()) {
            match parsed {
                Ok(cookie) => jar.add_original(cookie),
                Err(e) => tracing::debug!(error = %e, "skipping malformed request cookie"),
            }
        }
        Self::from_jar(jar)
    }

    /// `Set-Cookie` header values for every change since construction.
    pub fn set_cookie_headers(&self) -> Result<Vec<HeaderValue>, CookieError> {
        self.lock()
            .delta()
            .map(|c| {
                HeaderValue::from_str(&c.encoded().to_string())
                    .map_err(|e| CookieError::store(format!("invalid Set-Cookie header: {e}")))
            })
            .collect()
    }

    /// Consume the store and return the underlying jar.
    pub fn into_jar(self) -> CookieJar {
        self.jar.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, CookieJar> {
        // A panic while holding the lock cannot leave the jar half-written.
        self.jar.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn build(name: &str, value: &str, options: &CookieOptions) -> Cookie<'static> {
        let mut built = Cookie::new(name.to_string(), value.to_string());

        if let Some(path) = &options.path {
            built.set_path(path.clone());
        }
        if let Some(domain) = &options.domain {
            built.set_domain(domain.clone());
        }
        if let Some(secure) = options.secure {
            built.set_secure(secure);
        }
        if let Some(http_only) = options.http_only {
            built.set_http_only(http_only);
        }
        if let Some(same_site) = options.same_site {
            built.set_same_site(cookie::SameSite::from(same_site));
        }
        if let Some(max_age) = options.max_age {
            built.set_max_age(Duration::seconds(max_age));
        }
        if let Some(expires) = options.expires {
            built.set_expires(expires);
        }

        built
    }
}

impl CookieStore for JarCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).map(|c| c.value().to_string())
    }

    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> Result<(), CookieError> {
        if name.is_empty() {
            return Err(CookieError::store("cookie name must not be empty"));
        }

        // An already-expired write behaves like a delete, as in a browser.
        let now = OffsetDateTime::now_utc();
        if compute_expiry(options, now).is_some_and(|at| at <= now) {
            self.delete(name, options);
            return Ok(());
        }

        self.lock().add(Self::build(name, value, options));
        Ok(())
    }

    fn delete(&self, name: &str, options: &CookieOptions) {
        let cookie = Self::build(name, "", &options.scope());
        self.lock().remove(cookie);
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().iter().map(|c| c.name().to_string()).collect();
        names.sort();
        names
    }
}
