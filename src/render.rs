// src/render.rs
//! RSS 2.0 rendering of a [`Feed`].

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::FeedError;
use crate::ingest::types::{Feed, FeedItem};

pub const GENERATOR: &str = concat!("fortnite-news-feed ", env!("CARGO_PKG_VERSION"));

pub fn to_rss(feed: &Feed) -> Result<String, FeedError> {
    to_rss_at(feed, Utc::now())
}

/// Same as [`to_rss`] with an explicit `lastBuildDate`.
pub fn to_rss_at(feed: &Feed, built_at: DateTime<Utc>) -> Result<String, FeedError> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    emit(&mut w, Event::Start(rss))?;
    emit(&mut w, Event::Start(BytesStart::new("channel")))?;

    text_element(&mut w, "title", &feed.title)?;
    text_element(&mut w, "link", &feed.link)?;
    text_element(&mut w, "description", &feed.title)?;
    text_element(&mut w, "generator", GENERATOR)?;
    text_element(&mut w, "lastBuildDate", &built_at.to_rfc2822())?;

    for item in &feed.item {
        write_item(&mut w, item)?;
    }

    emit(&mut w, Event::End(BytesEnd::new("channel")))?;
    emit(&mut w, Event::End(BytesEnd::new("rss")))?;

    String::from_utf8(w.into_inner()).map_err(|e| FeedError::Render(e.to_string()))
}

fn write_item(w: &mut Writer<Vec<u8>>, item: &FeedItem) -> Result<(), FeedError> {
    emit(w, Event::Start(BytesStart::new("item")))?;
    text_element(w, "title", &item.title)?;
    text_element(w, "description", &item.description)?;
    text_element(w, "link", &item.link)?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    emit(w, Event::Start(guid))?;
    emit(w, Event::Text(BytesText::new(&item.link)))?;
    emit(w, Event::End(BytesEnd::new("guid")))?;

    if let Some(ts) = item.pub_date {
        text_element(w, "pubDate", &ts.to_rfc2822())?;
    }
    if !item.author.is_empty() {
        text_element(w, "author", &item.author)?;
    }
    emit(w, Event::End(BytesEnd::new("item")))
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), FeedError> {
    emit(w, Event::Start(BytesStart::new(name)))?;
    emit(w, Event::Text(BytesText::new(text)))?;
    emit(w, Event::End(BytesEnd::new(name)))
}

fn emit(w: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), FeedError> {
    w.write_event(event)
        .map_err(|e| FeedError::Render(e.to_string()))
}
