//! Loading configuration from disk.

use cookieguard::config::AllowedValues;
use cookieguard::consent::Category;
use cookieguard::{CookieConfig, CookieError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_from_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cookies.json");
    fs::write(
        &path,
        r#"{
            "cookies": [
                {"name": "session", "critical": true, "options": {"max_age": 86400, "secure": true}},
                {"name": "consent_banner_seen", "allowed": {"one_of": ["yes"]}, "category": "functional"}
            ],
            "defaults": {"path": "/", "same_site": "lax", "http_only": true},
            "consent": {"version": 3},
            "expiration": {"warning_threshold": 600}
        }"#,
    )
    .unwrap();

    let config = CookieConfig::from_path(&path).unwrap();
    assert_eq!(config.consent.version, 3);
    assert_eq!(config.consent.cookie_name, "cookie_consent");
    assert_eq!(config.expiration.warning_threshold, 600);

    let session = config.definition("session").unwrap();
    let options = config.options_for(session);
    assert_eq!(options.max_age, Some(86_400));
    assert_eq!(options.secure, Some(true));
    assert_eq!(options.http_only, Some(true));

    let banner = config.definition("consent_banner_seen").unwrap();
    assert_eq!(banner.category, Category::Functional);
    assert_eq!(banner.allowed, AllowedValues::OneOf(vec!["yes".into()]));
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let err = CookieConfig::from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, CookieError::Config { .. }));
}

#[test]
fn test_invalid_schema_in_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cookies.json");
    fs::write(&path, r#"{"cookies": [{"name": "a"}, {"name": "a"}]}"#).unwrap();

    assert!(CookieConfig::from_path(&path).is_err());
}
