//! Store adapter tests through the public API.

use cookieguard::store::{CookieOptions, CookieStore, JarCookieStore, MemoryCookieStore, SameSite};

#[test]
fn test_jar_round_trip_through_headers() {
    // Request comes in with two cookies
    let jar = JarCookieStore::from_header("theme=dark; session=abc");

    // Handler rewrites one and deletes the other
    jar.set("theme", "light", &CookieOptions::new().path("/").same_site(SameSite::Lax))
        .unwrap();
    jar.delete("session", &CookieOptions::new().path("/"));

    let headers = jar.set_cookie_headers().unwrap();
    assert_eq!(headers.len(), 2);

    let rendered: Vec<&str> = headers.iter().map(|h| h.to_str().unwrap()).collect();
    assert!(rendered.iter().any(|h| h.starts_with("theme=light")));
    assert!(rendered.iter().any(|h| h.starts_with("session=") && h.contains("Max-Age=0")));
}

#[test]
fn test_jar_malformed_pairs_skipped() {
    let jar = JarCookieStore::from_header("good=1; =bad; also=2");
    assert_eq!(jar.get("good").as_deref(), Some("1"));
    assert_eq!(jar.get("also").as_deref(), Some("2"));
}

#[test]
fn test_jar_into_inner() {
    let jar = JarCookieStore::new();
    jar.set("a", "1", &CookieOptions::new()).unwrap();

    let inner = jar.into_jar();
    assert_eq!(inner.get("a").map(|c| c.value()), Some("1"));
}

#[test]
fn test_memory_store_shared_between_clones() {
    let store = MemoryCookieStore::new();
    let other = store.clone();

    store.set("a", "1", &CookieOptions::new()).unwrap();
    assert_eq!(other.get("a").as_deref(), Some("1"));

    other.delete("a", &CookieOptions::new());
    assert!(!store.contains("a"));
}

#[test]
fn test_memory_store_concurrent_writes() {
    let store = MemoryCookieStore::new();

    std::thread::scope(|s| {
        for t in 0..4 {
            let store = &store;
            s.spawn(move || {
                for i in 0..20 {
                    store
                        .set(&format!("t{t}_{i}"), "v", &CookieOptions::new())
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(store.len(), 80);
}
