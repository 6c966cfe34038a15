//! Candidate item data structure.

use serde::{Deserialize, Serialize};

/// One fetched article or feed entry.
///
/// Lives for a single run; never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CandidateItem {
    /// Stable id assigned by the originating platform (or the feed entry id)
    pub id: String,

    /// Article title
    pub title: String,

    /// Full URL to the article
    pub url: String,

    /// Like count; `None` when the source has no authoritative number
    pub likes: Option<u64>,

    /// Stock/save count
    pub stocks: Option<u64>,

    /// Flattened body text, empty until fetched (or when the fetch failed)
    #[serde(default)]
    pub body: String,

    /// Publication timestamp as reported upstream
    #[serde(default)]
    pub created_at: Option<String>,

    /// Name of the source that produced this item
    #[serde(default)]
    pub platform: String,
}

impl CandidateItem {
    /// Text scanned for evidence: the title, then the body.
    pub fn scan_text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.body)
        }
    }

    /// Likes for ranking purposes (missing counts as zero).
    pub fn likes_or_zero(&self) -> u64 {
        self.likes.unwrap_or(0)
    }

    /// Stocks for ranking purposes (missing counts as zero).
    pub fn stocks_or_zero(&self) -> u64 {
        self.stocks.unwrap_or(0)
    }

    /// Identity used to collapse the same article seen through several sources.
    pub fn canonical_id(&self) -> String {
        if self.url.is_empty() {
            format!("{}:{}", self.platform, self.id)
        } else {
            self.url.trim_end_matches('/').to_string()
        }
    }
}
