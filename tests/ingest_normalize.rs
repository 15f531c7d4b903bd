// tests/ingest_normalize.rs
//
// Fan-out/fan-in normalization: ordering, all-or-nothing, memoization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fortnite_news_feed::cache::{MokaItemCache, NoopItemCache};
use fortnite_news_feed::ingest::normalize_all;
use fortnite_news_feed::ingest::types::{FeedItem, ItemNormalizer, Language, SourceRecord};
use fortnite_news_feed::NormalizeError;

fn record(slug: &str) -> SourceRecord {
    SourceRecord {
        title: slug.to_uppercase(),
        slug: slug.to_string(),
        date: "2024-01-01".to_string(),
        author: "x".to_string(),
        content: format!("<p>{slug}</p>"),
        link: None,
    }
}

fn moka() -> MokaItemCache {
    MokaItemCache::new(1_000, Duration::from_secs(3600))
}

/// Sleeps longer for earlier records so completion order is reversed, and
/// tracks how many transforms are in flight at once.
#[derive(Default)]
struct SlowNormalizer {
    total: usize,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ItemNormalizer for SlowNormalizer {
    async fn normalize(
        &self,
        record: &SourceRecord,
        lang: &Language,
    ) -> Result<FeedItem, NormalizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let idx: usize = record.slug.trim_start_matches('s').parse().unwrap_or(0);
        let delay = (self.total - idx) as u64 * 5;
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(FeedItem {
            title: record.title.clone(),
            link: format!("https://example.test/{}?lang={lang}", record.slug),
            pub_date: None,
            author: record.author.clone(),
            description: record.content.clone(),
        })
    }
}

struct FailOn(&'static str);

#[async_trait]
impl ItemNormalizer for FailOn {
    async fn normalize(
        &self,
        record: &SourceRecord,
        _lang: &Language,
    ) -> Result<FeedItem, NormalizeError> {
        if record.slug == self.0 {
            return Err(NormalizeError::new(record.cache_key(), "bad record"));
        }
        Ok(FeedItem {
            title: record.title.clone(),
            link: record.slug.clone(),
            pub_date: None,
            author: String::new(),
            description: String::new(),
        })
    }
}

#[tokio::test]
async fn output_keeps_input_order_despite_reversed_completion() {
    let records: Vec<_> = (0..8).map(|i| record(&format!("s{i}"))).collect();
    let n = SlowNormalizer {
        total: records.len(),
        ..Default::default()
    };

    let items = normalize_all(&records, &Language::from("en-US"), &NoopItemCache, &n)
        .await
        .expect("normalize ok");

    assert_eq!(items.len(), records.len());
    for (rec, item) in records.iter().zip(&items) {
        assert_eq!(item.title, rec.title);
    }
    assert_eq!(
        n.peak.load(Ordering::SeqCst),
        records.len(),
        "every record should be in flight at once"
    );
}

#[tokio::test]
async fn empty_listing_yields_no_items() {
    let n = SlowNormalizer::default();
    let items = normalize_all(&[], &Language::from("ja"), &moka(), &n)
        .await
        .expect("empty ok");
    assert!(items.is_empty());
    assert_eq!(n.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn one_failure_fails_the_batch() {
    let records = vec![record("a"), record("bad"), record("c")];
    let err = normalize_all(&records, &Language::from("en-US"), &moka(), &FailOn("bad"))
        .await
        .expect_err("batch must fail");
    assert_eq!(err.key, "bad");
    assert_eq!(err.reason, "bad record");
}

#[tokio::test]
async fn repeated_keys_are_served_from_cache() {
    let cache = moka();
    let records: Vec<_> = (0..4).map(|i| record(&format!("s{i}"))).collect();
    let n = SlowNormalizer {
        total: records.len(),
        ..Default::default()
    };
    let lang = Language::from("en-US");

    let first = normalize_all(&records, &lang, &cache, &n).await.unwrap();
    let second = normalize_all(&records, &lang, &cache, &n).await.unwrap();

    assert_eq!(n.calls.load(Ordering::SeqCst), records.len());
    assert_eq!(first, second);
    for (a, b) in first.iter().zip(&second) {
        assert!(Arc::ptr_eq(a, b), "cache hit should return the same instance");
    }
}

#[tokio::test]
async fn duplicate_keys_in_one_listing_compute_once() {
    let cache = moka();
    let mut a = record("s1");
    let mut b = record("s1");
    a.link = Some("/news/shared".into());
    b.link = Some("/news/shared".into());
    let n = SlowNormalizer {
        total: 2,
        ..Default::default()
    };

    let items = normalize_all(&[a, b], &Language::from("en-US"), &cache, &n)
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(n.calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&items[0], &items[1]));
}

#[tokio::test]
async fn cached_items_are_not_shared_across_languages() {
    let cache = moka();
    let records: Vec<_> = (0..3).map(|i| record(&format!("s{i}"))).collect();
    let n = SlowNormalizer {
        total: records.len(),
        ..Default::default()
    };

    let en = normalize_all(&records, &Language::from("en-US"), &cache, &n)
        .await
        .unwrap();
    let ja = normalize_all(&records, &Language::from("ja"), &cache, &n)
        .await
        .unwrap();

    assert_eq!(n.calls.load(Ordering::SeqCst), 2 * records.len());
    assert!(en.iter().all(|it| it.link.ends_with("?lang=en-US")));
    assert!(ja.iter().all(|it| it.link.ends_with("?lang=ja")));
}
