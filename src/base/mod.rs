//! Base types and error handling.
//!
//! Provides foundational types shared by every policy layer:
//! - [`CookieError`](error::CookieError): error codes for the whole crate
//! - [`JsonResultExt`](context::JsonResultExt): JSON error context

pub mod context;
pub mod error;

#[cfg(test)]
mod tests;
