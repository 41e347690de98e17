//! Consent gating through the client.

use cookieguard::consent::{Category, ConsentChoices};
use cookieguard::store::MemoryCookieStore;
use cookieguard::{CookieClient, CookieConfig, CookieError};

fn client() -> CookieClient<MemoryCookieStore> {
    let config = CookieConfig::from_json(
        r#"{
            "cookies": [
                {"name": "session", "critical": true},
                {"name": "lang", "allowed": {"one_of": ["en", "de"]}, "category": "functional"},
                {"name": "_ga", "category": "analytics"},
                {"name": "ad_id", "category": "marketing", "critical": true}
            ]
        }"#,
    )
    .unwrap();
    CookieClient::new(MemoryCookieStore::new(), config)
}

#[test]
fn test_writes_blocked_until_consent() {
    let client = client();

    // Necessary cookies never need consent
    client.set("session", "s1").unwrap();

    let err = client.set("_ga", "GA1.2.3").unwrap_err();
    assert_eq!(
        err,
        CookieError::ConsentRequired {
            name: "_ga".into(),
            category: Category::Analytics,
        }
    );
    assert!(!client.has("_ga"));

    client
        .consent()
        .update_consent(ConsentChoices::default().with(Category::Analytics, true))
        .unwrap();
    client.set("_ga", "GA1.2.3").unwrap();
    assert!(client.has("_ga"));

    // Functional still blocked
    assert!(client.set("lang", "en").is_err());
}

#[test]
fn test_withdraw_purges_everything_of_category() {
    let client = client();
    client.consent().accept_all().unwrap();
    client.set("ad_id", "xyz").unwrap();
    client.set("lang", "de").unwrap();
    assert_eq!(client.backups().history("ad_id").len(), 1);

    let update = client.consent().withdraw(Category::Marketing).unwrap();
    assert_eq!(update.purged, vec!["ad_id".to_string()]);

    assert!(!client.has("ad_id"));
    assert!(client.backups().history("ad_id").is_empty());
    assert!(client.expiration().record("ad_id").is_none());
    assert!(client.has("lang"));

    // Recovery is gated too
    assert!(matches!(
        client.recover("ad_id"),
        Err(CookieError::ConsentRequired { .. })
    ));
}

#[test]
fn test_reject_all_keeps_necessary() {
    let client = client();
    client.consent().accept_all().unwrap();
    client.set("session", "s").unwrap();
    client.set("_ga", "g").unwrap();

    let update = client.consent().reject_all().unwrap();
    assert_eq!(update.purged, vec!["_ga".to_string()]);
    assert!(client.has("session"));
    assert!(client.consent().has_consent());
}

#[test]
fn test_consent_record_survives_clear_all() {
    let client = client();
    client.consent().accept_all().unwrap();
    client.set("lang", "en").unwrap();

    client.clear_all();
    assert!(client.consent().is_allowed(Category::Functional));
}

#[test]
fn test_can_write_unknown_cookie() {
    let client = client();
    assert!(matches!(
        client.consent().can_write("nope"),
        Err(CookieError::UnknownCookie { .. })
    ));
}
