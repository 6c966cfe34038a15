// src/services/qiita.rs

//! Qiita API v2 item source.
//!
//! Walks the paged `/items` listing, drops items below the like threshold,
//! then fetches `/items/{id}` bodies for the survivors with bounded
//! concurrency.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, CandidateItem, FetchConfig, MAX_PAGES};
use crate::services::ItemSource;
use crate::utils::{html, http, url};

/// Raw item as returned by the listing and detail endpoints.
///
/// Counts are kept as raw JSON values so that a non-numeric `likes_count`
/// excludes the item instead of failing the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub likes_count: Option<Value>,
    #[serde(default)]
    pub stocks_count: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub rendered_body: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl ApiItem {
    pub fn likes(&self) -> Option<u64> {
        self.likes_count.as_ref().and_then(Value::as_u64)
    }

    pub fn stocks(&self) -> Option<u64> {
        self.stocks_count.as_ref().and_then(Value::as_u64)
    }

    /// Plain-text body: rendered HTML flattened, else the markdown source.
    pub fn text_body(&self) -> String {
        match (&self.rendered_body, &self.body) {
            (Some(rendered), _) if !rendered.trim().is_empty() => html::flatten(rendered),
            (_, Some(markdown)) => markdown.trim().to_string(),
            _ => String::new(),
        }
    }

    /// Convert into a candidate. `None` when the like count is missing or
    /// not a number.
    pub fn into_candidate(self, platform: &str, with_body: bool) -> Option<CandidateItem> {
        let likes = self.likes()?;
        let body = if with_body {
            self.text_body()
        } else {
            String::new()
        };
        Some(CandidateItem {
            likes: Some(likes),
            stocks: Some(self.stocks().unwrap_or(0)),
            body,
            id: self.id,
            title: self.title,
            url: self.url,
            created_at: self.created_at,
            platform: platform.to_string(),
        })
    }
}

/// Parse one listing page.
pub fn parse_listing(json: &str) -> Result<Vec<ApiItem>> {
    Ok(serde_json::from_str(json)?)
}

/// Parse one detail response.
pub fn parse_detail(json: &str) -> Result<ApiItem> {
    Ok(serde_json::from_str(json)?)
}

/// Item source backed by the Qiita API.
#[derive(Clone)]
pub struct QiitaSource {
    client: Client,
    api: ApiConfig,
    fetch: FetchConfig,
}

impl QiitaSource {
    /// Create a source with its own HTTP client (bearer token applied when set).
    pub fn new(api: ApiConfig, fetch: FetchConfig) -> Result<Self> {
        let client = http::create_client(&fetch, api.token.as_deref())?;
        Ok(Self::with_client(client, api, fetch))
    }

    pub fn with_client(client: Client, api: ApiConfig, fetch: FetchConfig) -> Self {
        Self { client, api, fetch }
    }

    fn listing_url(&self, page: u32) -> Result<String> {
        let page = page.to_string();
        let per_page = self.api.per_page.to_string();
        let mut query = vec![("page", page.as_str()), ("per_page", per_page.as_str())];
        if let Some(q) = self.api.query.as_deref().filter(|q| !q.trim().is_empty()) {
            query.push(("query", q));
        }
        url::endpoint(&self.api.base_url, "items", &query)
    }

    fn detail_url(&self, id: &str) -> Result<String> {
        url::endpoint(&self.api.base_url, &format!("items/{id}"), &[])
    }

    /// Fetch a single article by id, body included.
    pub async fn fetch_item(&self, id: &str) -> Result<ApiItem> {
        let url = self.detail_url(id)?;
        let text = http::fetch_text(&self.client, &url).await?;
        parse_detail(&text)
    }

    /// Walk the listing, tolerating individual page failures.
    ///
    /// Fails only when no page at all could be fetched and parsed.
    async fn fetch_listing(&self, pages: u32) -> Result<Vec<ApiItem>> {
        let pages = pages.clamp(1, MAX_PAGES);
        let delay = Duration::from_millis(self.fetch.request_delay_ms);
        let backoff = Duration::from_millis(self.fetch.retry_backoff_ms);
        let mut items = Vec::new();
        let mut answered = 0;

        for page in 1..=pages {
            if page > 1 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let url = match self.listing_url(page) {
                Ok(url) => url,
                Err(e) => {
                    log::warn!("Skipping page {}: {}", page, e);
                    continue;
                }
            };

            let body =
                match http::fetch_text_with_retry(&self.client, &url, self.fetch.max_retries, backoff)
                    .await
                {
                    Ok(body) => body,
                    Err(e) => {
                        log::warn!("Failed to fetch page {} ({}): {}", page, url, e);
                        continue;
                    }
                };

            let batch = match parse_listing(&body) {
                Ok(batch) => batch,
                Err(e) => {
                    log::warn!("Failed to parse page {} ({}): {}", page, url, e);
                    continue;
                }
            };

            answered += 1;
            let count = batch.len();
            log::info!("page {}: {} items", page, count);
            items.extend(batch);

            if count == 0 || count < self.api.per_page as usize {
                break;
            }
        }

        if answered == 0 {
            return Err(AppError::fetch(
                self.name(),
                format!("none of {pages} listing page(s) could be fetched"),
            ));
        }
        Ok(items)
    }

    /// Replace listing bodies with detail bodies, preserving order.
    async fn attach_bodies(&self, items: Vec<CandidateItem>) -> Vec<CandidateItem> {
        let concurrency = self.fetch.max_concurrent.max(1);
        stream::iter(items)
            .map(|mut item| async move {
                match self.fetch_item(&item.id).await {
                    Ok(detail) => item.body = detail.text_body(),
                    Err(e) => {
                        log::warn!("Failed to fetch body for {} ({}): {}", item.id, item.url, e);
                        item.body.clear();
                    }
                }
                item
            })
            .buffered(concurrency)
            .collect()
            .await
    }
}

#[async_trait]
impl ItemSource for QiitaSource {
    fn name(&self) -> &str {
        &self.api.platform
    }

    async fn fetch_candidates(&self, pages: u32, min_likes: u64) -> Result<Vec<CandidateItem>> {
        let listing = self.fetch_listing(pages).await?;
        let fetched = listing.len();

        let candidates: Vec<CandidateItem> = listing
            .into_iter()
            .filter_map(|raw| {
                let id = raw.id.clone();
                let candidate = raw.into_candidate(self.name(), !self.api.fetch_bodies);
                if candidate.is_none() {
                    log::debug!("Item {} has no numeric likes_count, skipped", id);
                }
                candidate
            })
            .filter(|item| item.likes_or_zero() >= min_likes)
            .collect();

        log::info!(
            "{}: {} fetched, {} with likes >= {}",
            self.name(),
            fetched,
            candidates.len(),
            min_likes
        );

        if self.api.fetch_bodies && !candidates.is_empty() {
            Ok(self.attach_bodies(candidates).await)
        } else {
            Ok(candidates)
        }
    }
}
