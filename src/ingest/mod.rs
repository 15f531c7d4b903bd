// src/ingest/mod.rs
pub mod config;
pub mod options;
pub mod providers;
pub mod types;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::future::{try_join_all, FutureExt};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use url::Url;

use crate::browser::PageDriver;
use crate::cache::ItemCache;
use crate::error::{FeedError, NormalizeError};
use crate::ingest::types::{BlogListing, FeedItem, ItemNormalizer, Language, SourceRecord};

pub const LISTING_PATH: &str = "/api/blog/getPosts";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_fetch_total", "Listing fetches issued.");
        describe_counter!(
            "feed_fetch_errors_total",
            "Listing fetches that failed (driver or decode)."
        );
        describe_counter!("feed_items_total", "Feed items produced.");
        describe_histogram!(
            "feed_normalize_ms",
            "Time to normalize one listing, in milliseconds."
        );
    });
}

/// `{base}/api/blog/getPosts?category=&postsPerPage=0&offset=0&locale={lang}&rootPageSlug=blog`
pub fn listing_url(api_base: &Url, lang: &Language) -> Result<Url, url::ParseError> {
    let mut url = api_base.join(LISTING_PATH)?;
    url.set_query(Some(&format!(
        "category=&postsPerPage=0&offset=0&locale={lang}&rootPageSlug=blog"
    )));
    Ok(url)
}

/// Fetch and decode the blog listing. Single attempt; errors go to the caller as-is.
pub async fn fetch_listing(driver: &dyn PageDriver, url: &Url) -> Result<BlogListing, FeedError> {
    ensure_metrics_described();

    tracing::info!(target: "http", url = %url, "Requesting {url}");
    counter!("feed_fetch_total").increment(1);

    let doc = match driver.open(url).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(error = ?e, driver = driver.name(), "listing fetch failed");
            counter!("feed_fetch_errors_total").increment(1);
            return Err(e.into());
        }
    };

    doc.json::<BlogListing>().map_err(|e| {
        tracing::warn!(error = %e, url = %url, "listing decode failed");
        counter!("feed_fetch_errors_total").increment(1);
        FeedError::Decode(e)
    })
}

/// Cache key of one record for one language. Items carry the language in their
/// link, so keys are scoped per language.
pub fn item_cache_key(lang: &Language, record: &SourceRecord) -> String {
    format!("{lang}\u{0}{}", record.cache_key())
}

/// Normalize every record concurrently through the cache. The result keeps the
/// input order; the first failure fails the whole batch.
pub async fn normalize_all(
    records: &[SourceRecord],
    lang: &Language,
    cache: &dyn ItemCache,
    normalizer: &dyn ItemNormalizer,
) -> Result<Vec<Arc<FeedItem>>, NormalizeError> {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let jobs = records.iter().map(move |record| {
        if record.cache_key().is_empty() {
            tracing::warn!(
                title = %record.title,
                "record has neither link nor slug; sharing the empty cache key"
            );
        }
        let key = item_cache_key(lang, record);
        let init = async move { normalizer.normalize(record, lang).await }.boxed();
        cache.get_or_try_insert(key, init)
    });
    let items = try_join_all(jobs).await?;

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_normalize_ms").record(ms);
    counter!("feed_items_total").increment(items.len() as u64);
    tracing::debug!(items = items.len(), ms, "normalized listing");

    Ok(items)
}

/// Best-effort timestamp parsing for upstream date strings. Naive values are UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_DT: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for fmt in NAIVE_DT {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    // Unix timestamps: 13+ digits are milliseconds.
    if s.chars().all(|c| c.is_ascii_digit()) {
        let n: i64 = s.parse().ok()?;
        return if s.len() >= 13 {
            DateTime::from_timestamp_millis(n)
        } else {
            DateTime::from_timestamp(n, 0)
        };
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Document;
    use crate::cache::MokaItemCache;
    use crate::error::DriverError;
    use crate::ingest::providers::fortnite_news::FortniteNormalizer;
    use chrono::TimeZone;
    use std::fmt;
    use std::sync::Mutex;
    use std::time::Duration;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    type Log = Arc<Mutex<Vec<(String, Level, String)>>>;

    struct Capture(Log);

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut v = MessageVisitor(String::new());
            event.record(&mut v);
            let meta = event.metadata();
            self.0
                .lock()
                .unwrap()
                .push((meta.target().to_string(), *meta.level(), v.0));
        }
    }

    /// Records its own `open` call into the shared log so ordering can be checked.
    struct LoggingDriver(Log);

    #[async_trait::async_trait]
    impl PageDriver for LoggingDriver {
        async fn open(&self, url: &Url) -> Result<Document, DriverError> {
            self.0
                .lock()
                .unwrap()
                .push(("driver".into(), Level::TRACE, "open".into()));
            Ok(Document {
                url: url.to_string(),
                status: 200,
                content_type: Some("application/json".into()),
                body: r#"{"blogList":[]}"#.into(),
            })
        }
        fn name(&self) -> &'static str {
            "logging"
        }
    }

    #[tokio::test]
    async fn fetch_logs_request_url_before_driver_call() {
        let log: Log = Arc::default();
        let subscriber = tracing_subscriber::registry().with(Capture(log.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let url = listing_url(
            &Url::parse("https://www.fortnite.com").unwrap(),
            &Language::from("ja"),
        )
        .unwrap();
        let listing = fetch_listing(&LoggingDriver(log.clone()), &url).await.unwrap();
        assert!(listing.blog_list.is_empty());

        let log = log.lock().unwrap();
        let http: Vec<_> = log.iter().filter(|(t, _, _)| t == "http").collect();
        assert_eq!(http.len(), 1, "exactly one http log line: {log:?}");
        assert_eq!(http[0].1, Level::INFO);
        assert_eq!(http[0].2, format!("Requesting {url}"));

        let log_at = log.iter().position(|(t, _, _)| t == "http").unwrap();
        let open_at = log.iter().position(|(t, _, _)| t == "driver").unwrap();
        assert!(log_at < open_at, "log line must precede the fetch");
    }

    #[tokio::test]
    async fn keyless_record_is_reported() {
        let log: Log = Arc::default();
        let subscriber = tracing_subscriber::registry().with(Capture(log.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let cache = MokaItemCache::new(16, Duration::from_secs(60));
        let normalizer = FortniteNormalizer::new("https://www.fortnite.com");
        let records = [SourceRecord {
            title: "orphan".into(),
            ..Default::default()
        }];
        let items = normalize_all(&records, &Language::from("en-US"), &cache, &normalizer)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);

        let log = log.lock().unwrap();
        assert!(
            log.iter()
                .any(|(_, lvl, msg)| *lvl == Level::WARN && msg.contains("neither link nor slug")),
            "expected an empty-key warning: {log:?}"
        );
    }

    #[test]
    fn cache_key_is_scoped_per_language() {
        let rec = SourceRecord {
            slug: "a".into(),
            ..Default::default()
        };
        let en = item_cache_key(&Language::from("en-US"), &rec);
        let ja = item_cache_key(&Language::from("ja"), &rec);
        assert_ne!(en, ja);
        assert_eq!(ja, "ja\u{0}a");
        assert_eq!(en, item_cache_key(&Language::from("en-US"), &rec));
    }

    #[test]
    fn listing_url_matches_upstream_shape() {
        let base = Url::parse("https://www.fortnite.com").unwrap();
        let url = listing_url(&base, &Language::from("ja")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.fortnite.com/api/blog/getPosts?category=&postsPerPage=0&offset=0&locale=ja&rootPageSlug=blog"
        );
    }

    #[test]
    fn listing_url_ignores_base_path() {
        let base = Url::parse("http://127.0.0.1:8080/some/prefix").unwrap();
        let url = listing_url(&base, &Language::from("en-US")).unwrap();
        assert_eq!(url.path(), "/api/blog/getPosts");
        assert!(url.query().unwrap().contains("locale=en-US"));
    }

    #[test]
    fn parse_date_accepts_common_shapes() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-01-01"), Some(midnight));
        assert_eq!(parse_date("2024/01/01"), Some(midnight));
        assert_eq!(parse_date("2024-01-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_date("2024-01-01T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_date("Mon, 01 Jan 2024 00:00:00 GMT"), Some(midnight));
        assert_eq!(parse_date("2024-01-01 00:00:00"), Some(midnight));
        assert_eq!(parse_date("2024-01-01T00:00:00.000"), Some(midnight));
        assert_eq!(parse_date("1704067200"), Some(midnight));
        assert_eq!(parse_date("1704067200000"), Some(midnight));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-45"), None);
    }
}
