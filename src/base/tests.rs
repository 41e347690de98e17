use crate::base::error::CookieError;
use crate::consent::Category;

#[test]
fn test_error_codes_are_stable() {
    assert_eq!(CookieError::unknown_cookie("theme").as_i32(), -1000);
    assert_eq!(
        CookieError::ConsentRequired {
            name: "ga".into(),
            category: Category::Analytics,
        }
        .as_i32(),
        -1020
    );
    assert_eq!(CookieError::config("bad").as_i32(), -1081);
}

#[test]
fn test_error_codes_in_reserved_range() {
    let errors = [
        CookieError::unknown_cookie("a"),
        CookieError::not_found("a"),
        CookieError::store("down"),
        CookieError::NoBackup { name: "a".into() },
        CookieError::InvalidLifetime {
            name: "a".into(),
            seconds: -5,
        },
        CookieError::ChecksumMismatch {
            name: "a".into(),
            expected: 1,
            actual: 2,
        },
    ];

    for err in errors {
        assert!((-1099..=-1000).contains(&err.as_i32()), "{err}");
    }
}

#[test]
fn test_cookie_name() {
    assert_eq!(CookieError::not_found("session").cookie_name(), Some("session"));
    assert_eq!(CookieError::store("down").cookie_name(), None);
}

#[test]
fn test_policy_rejection() {
    assert!(CookieError::ValueTooLarge {
        name: "a".into(),
        size: 5000,
        max: 4096,
    }
    .is_policy_rejection());
    assert!(!CookieError::NoBackup { name: "a".into() }.is_policy_rejection());
}

#[test]
fn test_display_mentions_category() {
    let err = CookieError::ConsentRequired {
        name: "_ga".into(),
        category: Category::Analytics,
    };
    assert_eq!(err.to_string(), "Cookie '_ga' requires analytics consent");
}
