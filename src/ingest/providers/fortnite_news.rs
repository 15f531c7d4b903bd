use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::browser::{HttpPageDriver, PageDriver};
use crate::cache::{ItemCache, MokaItemCache, NoopItemCache};
use crate::error::{FeedError, NormalizeError};
use crate::ingest::config::FeedConfig;
use crate::ingest::options::{resolve_language, LANG_KEY};
use crate::ingest::providers::RouteDescriptor;
use crate::ingest::types::{Feed, FeedItem, ItemNormalizer, Language, SourceRecord};
use crate::ingest::{fetch_listing, listing_url, normalize_all, parse_date};

pub const FEED_TITLE: &str = "Fortnite News";
pub const NEWS_PATH: &str = "news";

pub static ROUTE: RouteDescriptor = RouteDescriptor {
    namespace: "fortnite",
    path: "/news/:options?",
    name: "News",
    categories: &["game"],
    example: "/fortnite/news",
    maintainers: &["lyqluis"],
    require_puppeteer: true,
    anti_crawler: false,
    parameters: &[(
        LANG_KEY,
        "optional language, e.g. `/fortnite/news/lang=en-US`; defaults to en-US",
    )],
    languages: &[
        ("en-US", "English"),
        ("es-ES", "Spanish"),
        ("ja", "Japanese"),
        ("fr", "French"),
        ("ko", "Korean"),
        ("pl", "Polish"),
    ],
};

/// `{root}/news/{slug}?lang={lang}`
pub fn item_link(root_url: &str, slug: &str, lang: &Language) -> String {
    format!("{root_url}/{NEWS_PATH}/{slug}?lang={lang}")
}

/// `{root}/news?lang={lang}`
pub fn feed_link(root_url: &str, lang: &Language) -> String {
    format!("{root_url}/{NEWS_PATH}?lang={lang}")
}

pub fn assemble_feed(root_url: &str, lang: &Language, item: Vec<Arc<FeedItem>>) -> Feed {
    Feed {
        title: FEED_TITLE.to_string(),
        link: feed_link(root_url, lang),
        item,
    }
}

/// Maps a blog post onto a feed item; the post HTML becomes the description.
pub struct FortniteNormalizer {
    root_url: String,
}

impl FortniteNormalizer {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
        }
    }
}

#[async_trait]
impl ItemNormalizer for FortniteNormalizer {
    async fn normalize(
        &self,
        record: &SourceRecord,
        lang: &Language,
    ) -> Result<FeedItem, NormalizeError> {
        Ok(FeedItem {
            title: record.title.clone(),
            link: item_link(&self.root_url, &record.slug, lang),
            pub_date: parse_date(&record.date),
            author: record.author.clone(),
            description: record.content.clone(),
        })
    }
}

/// The `/fortnite/news/:options?` handler with its collaborators.
pub struct FortniteNews {
    driver: Arc<dyn PageDriver>,
    cache: Arc<dyn ItemCache>,
    normalizer: Arc<dyn ItemNormalizer>,
    root_url: String,
    api_base: Url,
    default_language: String,
}

impl FortniteNews {
    pub fn new(
        cfg: &FeedConfig,
        driver: Arc<dyn PageDriver>,
        cache: Arc<dyn ItemCache>,
    ) -> Result<Self, FeedError> {
        let root_url = cfg.root_url.trim_end_matches('/').to_string();
        Ok(Self {
            driver,
            cache,
            normalizer: Arc::new(FortniteNormalizer::new(root_url.clone())),
            root_url,
            api_base: cfg.api_base_url()?,
            default_language: cfg.default_language.clone(),
        })
    }

    /// Production wiring: HTTP driver plus a moka cache (or none when disabled).
    pub fn from_config(cfg: &FeedConfig) -> Result<Self, FeedError> {
        let driver = Arc::new(HttpPageDriver::new(&cfg.user_agent)?);
        let cache: Arc<dyn ItemCache> = if cfg.cache_enabled {
            Arc::new(MokaItemCache::new(cfg.cache_capacity, cfg.cache_ttl()))
        } else {
            Arc::new(NoopItemCache)
        };
        Self::new(cfg, driver, cache)
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn ItemNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn descriptor(&self) -> &'static RouteDescriptor {
        &ROUTE
    }

    pub async fn handle(&self, options: Option<&str>) -> Result<Feed, FeedError> {
        let lang = resolve_language(options, &self.default_language);
        let api_url = listing_url(&self.api_base, &lang)?;

        let listing = fetch_listing(self.driver.as_ref(), &api_url).await?;
        let item = normalize_all(
            &listing.blog_list,
            &lang,
            self.cache.as_ref(),
            self.normalizer.as_ref(),
        )
        .await?;

        tracing::info!(lang = %lang, items = item.len(), "fortnite news feed built");
        Ok(assemble_feed(&self.root_url, &lang, item))
    }
}
