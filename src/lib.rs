//! # cookieguard
//!
//! A typed policy layer over a web framework's per-request cookie store.
//!
//! `cookieguard` never touches HTTP itself. It reads and writes strings by
//! name through a [`CookieStore`](store::CookieStore) and adds the rules a
//! real application needs on top.
//!
//! ## Features
//!
//! - **Schema**: every cookie is declared, with its allowed values
//! - **Size limits**: name plus encoded value must fit the configured budget
//! - **Consent**: writes are gated per category; withdrawing purges
//! - **Backups**: critical cookies keep a checksummed history for recovery
//! - **Expiration**: expiry is recorded per write, classified and extendable
//!
//! ## Quick Start
//!
//! ```rust
//! use cookieguard::{CookieClient, CookieConfig, CookieDefinition};
//! use cookieguard::store::JarCookieStore;
//!
//! let config = CookieConfig::builder()
//!     .cookie(CookieDefinition::new("session").critical(true))
//!     .build()?;
//!
//! // Seed from the request's Cookie header.
//! let client = CookieClient::new(JarCookieStore::from_header("session=abc"), config);
//! assert!(client.has("session"));
//!
//! client.set("session", "rotated")?;
//! let headers = client.store().set_cookie_headers()?;
//! assert!(!headers.is_empty());
//! # Ok::<(), cookieguard::CookieError>(())
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type and error context helpers
//! - [`store`] - The key-value cookie primitive and its adapters
//! - [`config`] - Cookie schema and policy settings
//! - [`codec`] - Value serialization and schema validation
//! - [`consent`] - Consent categories, records and purging
//! - [`backup`] - Snapshot history and recovery
//! - [`expiration`] - Expiry records, classification and cleanup
//! - [`client`] - The facade tying it all together

pub mod backup;
pub mod base;
pub mod client;
pub mod codec;
pub mod config;
pub mod consent;
pub mod expiration;
pub mod store;

pub use base::error::CookieError;
pub use client::CookieClient;
pub use codec::CookieValue;
pub use config::{CookieConfig, CookieDefinition};
