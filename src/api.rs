use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::error::FeedError;
use crate::ingest::providers::fortnite_news::FortniteNews;
use crate::ingest::providers::{routes, RouteDescriptor};
use crate::render;

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    pub news: Arc<FortniteNews>,
}

impl AppState {
    pub fn new(news: FortniteNews) -> Self {
        Self {
            news: Arc::new(news),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/routes", get(list_routes))
        .route("/fortnite/news", get(news_default))
        .route("/fortnite/news/{options}", get(news_with_options))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, serde::Deserialize)]
struct FormatQuery {
    /// `json` for the feed object; anything else renders RSS.
    format: Option<String>,
}

async fn list_routes() -> Json<Vec<&'static RouteDescriptor>> {
    Json(routes())
}

async fn news_default(State(state): State<AppState>, Query(q): Query<FormatQuery>) -> Response {
    serve_news(&state, None, q).await
}

async fn news_with_options(
    State(state): State<AppState>,
    Path(options): Path<String>,
    Query(q): Query<FormatQuery>,
) -> Response {
    serve_news(&state, Some(options), q).await
}

async fn serve_news(state: &AppState, options: Option<String>, q: FormatQuery) -> Response {
    let feed = match state.news.handle(options.as_deref()).await {
        Ok(feed) => feed,
        Err(e) => return error_response(e),
    };

    if q.format.as_deref() == Some("json") {
        return Json(feed).into_response();
    }
    match render::to_rss(&feed) {
        Ok(xml) => ([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], xml).into_response(),
        Err(e) => error_response(e),
    }
}

fn status_for(e: &FeedError) -> StatusCode {
    if e.is_upstream() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(e: FeedError) -> Response {
    let status = status_for(&e);
    tracing::warn!(error = %e, status = status.as_u16(), "feed request failed");
    (status, e.to_string()).into_response()
}
