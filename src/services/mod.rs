//! Service layer for the ranking pipeline.
//!
//! - Item sources (`QiitaSource`, `FeedSource`) behind the `ItemSource` trait
//! - Book evidence detection (`EvidenceExtractor`)
//! - Per-book aggregation (`Aggregator`)

mod aggregator;
mod extractor;
mod qiita;
#[cfg(feature = "rss")]
mod rss;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CandidateItem;

pub use aggregator::Aggregator;
pub use extractor::EvidenceExtractor;
pub use qiita::{ApiItem, QiitaSource};
#[cfg(feature = "rss")]
pub use rss::{FeedEntry, FeedSource, parse_feed};

/// A producer of candidate items for one run.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Short source name recorded in the output document.
    fn name(&self) -> &str;

    /// Fetch candidates. Sources with engagement counts drop items below
    /// `min_likes` before any per-item work.
    async fn fetch_candidates(&self, pages: u32, min_likes: u64) -> Result<Vec<CandidateItem>>;
}
