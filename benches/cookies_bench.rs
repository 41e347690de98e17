use cookieguard::consent::Category;
use cookieguard::store::MemoryCookieStore;
use cookieguard::{CookieClient, CookieConfig, CookieDefinition};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn client() -> CookieClient<MemoryCookieStore> {
    let config = CookieConfig::builder()
        .cookie(CookieDefinition::new("session").critical(true))
        .cookie(
            CookieDefinition::new("theme")
                .one_of(["light", "dark"])
                .category(Category::Functional),
        )
        .cookie(CookieDefinition::new("prefs").json().category(Category::Functional))
        .build()
        .unwrap();
    let client = CookieClient::new(MemoryCookieStore::new(), config);
    client.consent().accept_all().unwrap();
    client
}

fn benchmark_cookie_set(c: &mut Criterion) {
    let client = client();

    c.bench_function("cookie_set_text", |b| {
        b.iter(|| {
            client.set(black_box("theme"), black_box("dark")).unwrap();
        })
    });

    c.bench_function("cookie_set_critical", |b| {
        b.iter(|| {
            client.set(black_box("session"), black_box("abc123")).unwrap();
        })
    });
}

fn benchmark_cookie_get(c: &mut Criterion) {
    let client = client();
    client
        .set("prefs", json!({"lang": "en", "dense": true, "tabs": [1, 2, 3]}))
        .unwrap();

    c.bench_function("cookie_get_json", |b| {
        b.iter(|| {
            black_box(client.get(black_box("prefs")).unwrap());
        })
    });
}

criterion_group!(benches, benchmark_cookie_set, benchmark_cookie_get);
criterion_main!(benches);
