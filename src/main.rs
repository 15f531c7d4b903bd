//! Fortnite News feed — binary entrypoint.
//! Boots the Axum HTTP server with the feed route, metrics and middleware.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fortnite_news_feed::api::{self, AppState};
use fortnite_news_feed::ingest::config::load_config_default;
use fortnite_news_feed::metrics::Metrics;
use fortnite_news_feed::FortniteNews;

/// Dev tracing needs BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FEED_DEV_LOG=1
fn dev_tracing_allowed(
    dev_flag: Option<&str>,
    shuttle_env: Option<&str>,
    debug_build: bool,
) -> bool {
    let is_dev_env = debug_build
        || matches!(
            shuttle_env.unwrap_or_default().to_ascii_lowercase().as_str(),
            "local" | "development" | "dev"
        );
    dev_flag == Some("1") && is_dev_env
}

/// Install our own subscriber in development only; otherwise the runtime's
/// default logging stays in place. `FEED_LOG_JSON=1` switches to JSON lines.
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FEED_DEV_LOG").ok();
    let shuttle_env = std::env::var("SHUTTLE_ENV").ok();
    if !dev_tracing_allowed(
        dev_flag.as_deref(),
        shuttle_env.as_deref(),
        cfg!(debug_assertions),
    ) {
        return;
    }

    let json = std::env::var("FEED_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fortnite_news_feed=debug,http=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialized: {e}");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = load_config_default().context("loading feed config")?;
    tracing::info!(
        root = %cfg.root_url,
        api = %cfg.api_base,
        lang = %cfg.default_language,
        cache = cfg.cache_enabled,
        ttl_secs = cfg.cache_ttl_secs,
        "feed config loaded"
    );

    let news = FortniteNews::from_config(&cfg).context("building fortnite news route")?;
    let metrics = Metrics::init(cfg.cache_ttl_secs)?;

    let router = api::router(AppState::new(news)).merge(metrics.router());

    Ok(router.into())
}
