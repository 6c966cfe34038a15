// src/services/rss.rs

//! RSS 2.0 / Atom feed item source.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{CandidateItem, FeedConfig, FetchConfig};
use crate::services::{ItemSource, QiitaSource};
use crate::utils::{html, http, url};

/// Platform name recorded for feed-derived items.
const FEED_PLATFORM: &str = "rss";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
    #[serde(default)]
    guid: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct Atom {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(default)]
    content: Option<Text>,
    #[serde(default)]
    summary: Option<Text>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

/// Element text that may also carry attributes (`type="html"`, `isPermaLink`).
#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

/// One parsed feed entry with its HTML content already flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub content: String,
    pub published: Option<String>,
}

impl FeedEntry {
    fn into_candidate(self) -> CandidateItem {
        CandidateItem {
            id: self.id,
            title: self.title,
            url: self.link,
            likes: None,
            stocks: None,
            body: self.content,
            created_at: self.published,
            platform: FEED_PLATFORM.to_string(),
        }
    }
}

/// Name of the first element in the document.
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Parse an RSS 2.0 or Atom document. Relative links resolve against `base`.
pub fn parse_feed(xml: &str, base: &str) -> Result<Vec<FeedEntry>> {
    let entries = match root_element(xml).as_deref() {
        Some("rss") => {
            let rss: Rss = quick_xml::de::from_str(xml)?;
            rss.channel
                .items
                .into_iter()
                .map(|item| FeedEntry {
                    id: item
                        .guid
                        .map(|g| g.value.trim().to_string())
                        .unwrap_or_default(),
                    title: clean(item.title),
                    content: html::flatten(&clean(item.description)),
                    published: item.pub_date.map(|d| d.trim().to_string()),
                    link: clean(item.link),
                })
                .collect::<Vec<_>>()
        }
        Some("feed") => {
            let atom: Atom = quick_xml::de::from_str(xml)?;
            atom.entries
                .into_iter()
                .map(|entry| {
                    let link = entry
                        .links
                        .iter()
                        .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
                        .or_else(|| entry.links.first())
                        .map(|l| l.href.trim().to_string())
                        .unwrap_or_default();
                    let body = entry.content.or(entry.summary).map(|t| t.value);
                    FeedEntry {
                        id: clean(entry.id),
                        title: entry.title.map(|t| t.value.trim().to_string()).unwrap_or_default(),
                        content: html::flatten(&clean(body)),
                        published: entry.published.or(entry.updated),
                        link,
                    }
                })
                .collect()
        }
        Some(other) => {
            return Err(AppError::validation(format!(
                "unsupported feed root element <{other}>"
            )));
        }
        None => return Err(AppError::validation("document has no root element")),
    };

    Ok(entries
        .into_iter()
        .map(|mut entry| {
            entry.link = url::resolve(base, &entry.link).unwrap_or_default();
            if entry.id.is_empty() {
                entry.id = entry.link.clone();
            }
            entry
        })
        .filter(|entry| !entry.link.is_empty())
        .collect())
}

/// Item source reading configured RSS/Atom feeds.
pub struct FeedSource {
    client: Client,
    urls: Vec<String>,
    fetch: FetchConfig,
    enricher: Option<QiitaSource>,
}

impl FeedSource {
    pub fn new(feeds: &FeedConfig, fetch: FetchConfig, enricher: Option<QiitaSource>) -> Result<Self> {
        let client = http::create_client(&fetch, None)?;
        Ok(Self {
            client,
            urls: feeds.urls.clone(),
            fetch,
            enricher: enricher.filter(|_| feeds.enrich),
        })
    }

    async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<FeedEntry>> {
        let xml = http::fetch_text(&self.client, feed_url).await?;
        parse_feed(&xml, feed_url)
    }

    /// Pull engagement counts and the full body for entries that link to an
    /// API article. Leaves the item untouched on any failure.
    async fn enrich(&self, mut item: CandidateItem) -> CandidateItem {
        let Some(qiita) = &self.enricher else {
            return item;
        };
        let Some(id) = url::extract_article_id(&item.url) else {
            return item;
        };

        match qiita.fetch_item(&id).await {
            Ok(detail) => {
                item.likes = detail.likes();
                item.stocks = detail.stocks();
                let body = detail.text_body();
                if !body.is_empty() {
                    item.body = body;
                }
                log::debug!("Enriched {} with likes={:?}", item.url, item.likes);
            }
            Err(e) => log::warn!("Failed to enrich {} ({}): {}", id, item.url, e),
        }
        item
    }
}

#[async_trait]
impl ItemSource for FeedSource {
    fn name(&self) -> &str {
        FEED_PLATFORM
    }

    async fn fetch_candidates(&self, _pages: u32, _min_likes: u64) -> Result<Vec<CandidateItem>> {
        let mut items = Vec::new();
        for feed_url in &self.urls {
            match self.fetch_feed(feed_url).await {
                Ok(entries) => {
                    log::info!(
                        "feed {}: {} entries",
                        url::get_domain(feed_url).unwrap_or_else(|| feed_url.clone()),
                        entries.len()
                    );
                    items.extend(entries.into_iter().map(FeedEntry::into_candidate));
                }
                Err(e) => log::warn!("Skipping feed {}: {}", feed_url, e),
            }
        }

        if self.enricher.is_none() {
            return Ok(items);
        }

        let concurrency = self.fetch.max_concurrent.max(1);
        Ok(stream::iter(items)
            .map(|item| self.enrich(item))
            .buffered(concurrency)
            .collect()
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Tech blog</title>
    <link>https://blog.example.com/</link>
    <item>
      <title>Reading list</title>
      <link>https://qiita.com/alice/items/0123456789abcdef0123</link>
      <description>&lt;p&gt;ISBN: 978-4-87311-565-8&lt;/p&gt;</description>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0900</pubDate>
      <guid isPermaLink="false">entry-1</guid>
    </item>
    <item>
      <title>Relative</title>
      <link>/posts/2</link>
      <description><![CDATA[<a href="https://www.amazon.co.jp/dp/4873115655">buy</a>]]></description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Zenn feed</title>
  <entry>
    <id>tag:example.com,2024:1</id>
    <title type="html">Book notes</title>
    <link rel="alternate" href="https://zenn.dev/bob/articles/abc"/>
    <link rel="enclosure" href="https://zenn.dev/img.png"/>
    <updated>2024-02-01T00:00:00Z</updated>
    <summary type="html">&lt;b&gt;技術評論社&lt;/b&gt; の本</summary>
  </entry>
  <entry>
    <title>No link</title>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let entries = parse_feed(RSS, "https://blog.example.com/feed.xml").unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.id, "entry-1");
        assert_eq!(first.title, "Reading list");
        assert_eq!(first.content, "ISBN: 978-4-87311-565-8");
        assert_eq!(first.published.as_deref(), Some("Mon, 01 Jan 2024 00:00:00 +0900"));

        let second = &entries[1];
        assert_eq!(second.link, "https://blog.example.com/posts/2");
        assert_eq!(second.id, "https://blog.example.com/posts/2");
        assert!(second.content.contains("https://www.amazon.co.jp/dp/4873115655"));
    }

    #[test]
    fn test_parse_atom() {
        let entries = parse_feed(ATOM, "https://zenn.dev/feed").unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.id, "tag:example.com,2024:1");
        assert_eq!(entry.title, "Book notes");
        assert_eq!(entry.link, "https://zenn.dev/bob/articles/abc");
        assert_eq!(entry.content, "技術評論社 の本");
        assert_eq!(entry.published.as_deref(), Some("2024-02-01T00:00:00Z"));
    }

    #[test]
    fn test_parse_rejects_unknown_documents() {
        assert!(parse_feed("<html><body/></html>", "https://x.test/").is_err());
        assert!(parse_feed("", "https://x.test/").is_err());
    }

    #[test]
    fn test_entries_become_unrated_candidates() {
        let entries = parse_feed(RSS, "https://blog.example.com/feed.xml").unwrap();
        let item = entries[0].clone().into_candidate();
        assert_eq!(item.platform, "rss");
        assert_eq!(item.likes, None);
        assert_eq!(item.stocks, None);
        assert_eq!(item.url, "https://qiita.com/alice/items/0123456789abcdef0123");
        assert_eq!(
            url::extract_article_id(&item.url).as_deref(),
            Some("0123456789abcdef0123")
        );
    }

    #[tokio::test]
    async fn test_enrich_without_enricher_is_identity() {
        let feeds = FeedConfig::default();
        let source = FeedSource::new(&feeds, FetchConfig::default(), None).unwrap();
        let item = CandidateItem {
            url: "https://qiita.com/alice/items/0123456789abcdef0123".into(),
            ..Default::default()
        };
        assert_eq!(source.enrich(item.clone()).await, item);
        assert!(source.fetch_candidates(1, 0).await.unwrap().is_empty());
    }
}
