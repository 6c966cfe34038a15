//! Ranking document structures.
//!
//! The document is read by external consumers (display page, health check),
//! so field names follow their camelCase contract. Reading is lenient: a
//! missing or non-array `ranking` is an empty list, and individual malformed
//! entries are skipped.

use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One contributing article of a ranked book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(default)]
    pub url: String,

    /// Article title as originally seen
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub likes: u64,

    #[serde(default)]
    pub stocks: u64,

    /// Id of the article on its originating platform
    #[serde(
        default,
        alias = "qiitaId",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform_id: Option<String>,
}

/// One ranked book.
///
/// `mentions == sources.len()` and the totals equal the sums over `sources`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BookAggregate {
    /// Stable hash of the identity key
    #[serde(default)]
    pub id: String,

    /// Representative title
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    #[serde(default)]
    pub mentions: u64,

    /// Advisory score; see `RankingConfig`
    #[serde(default)]
    pub score: f64,

    #[serde(default)]
    pub total_likes: u64,

    #[serde(default)]
    pub total_stocks: u64,

    /// Contributing articles in discovery order
    #[serde(default)]
    pub sources: Vec<Source>,

    /// Unknown per-entry fields, carried through rewrites
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookAggregate {
    /// Recompute the advisory score from the current totals.
    pub fn rescore(&mut self, stock_weight: f64, mention_bonus: f64) {
        self.score = self.total_likes as f64
            + self.total_stocks as f64 * stock_weight
            + self.mentions as f64 * mention_bonus;
    }

    /// Ranking order: total likes, score, mentions (all descending), then id.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .total_likes
            .cmp(&self.total_likes)
            .then_with(|| other.score.total_cmp(&self.score))
            .then_with(|| other.mentions.cmp(&self.mentions))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// The persisted ranking artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RankingDocument {
    /// RFC 3339 generation timestamp
    #[serde(default)]
    pub generated_at: Option<String>,

    /// Platform names the items came from
    #[serde(default)]
    pub source: Vec<String>,

    /// Whether identifier evidence was required
    #[serde(default)]
    pub strict: bool,

    /// Like threshold used
    #[serde(default)]
    pub min_likes: u64,

    /// Listing pages fetched
    #[serde(default)]
    pub pages: u32,

    /// Ranked books
    #[serde(default, deserialize_with = "lenient_ranking")]
    pub ranking: Vec<BookAggregate>,

    /// Unknown top-level fields, carried through rewrites
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RankingDocument {
    /// Build a fresh document stamped with `generated_at`.
    pub fn new(
        source: Vec<String>,
        strict: bool,
        min_likes: u64,
        pages: u32,
        ranking: Vec<BookAggregate>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            generated_at: Some(timestamp(generated_at)),
            source,
            strict,
            min_likes,
            pages,
            ranking,
            extra: Map::new(),
        }
    }

    /// Total mentions across all ranked books.
    pub fn mention_count(&self) -> u64 {
        self.ranking.iter().map(|b| b.mentions).sum()
    }
}

/// Status reported to health checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub ok: bool,
    pub has_ranking: bool,
    pub count: usize,
    pub generated_at: Option<String>,
}

impl HealthStatus {
    /// Summarize a (possibly missing) ranking document.
    pub fn from_document(document: Option<&RankingDocument>) -> Self {
        let count = document.map_or(0, |d| d.ranking.len());
        Self {
            ok: true,
            has_ranking: count > 0,
            count,
            generated_at: document.and_then(|d| d.generated_at.clone()),
        }
    }
}

/// Format a timestamp the way the document stores it.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn lenient_ranking<'de, D>(deserializer: D) -> Result<Vec<BookAggregate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let entries = match value {
        Some(Value::Array(entries)) => entries,
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(_) => {
            log::warn!("Stored ranking is not an array; treating it as empty");
            return Ok(Vec::new());
        }
    };

    let mut ranking = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<BookAggregate>(entry) {
            Ok(book) => ranking.push(book),
            Err(e) => log::warn!("Skipping malformed ranking entry #{}: {}", index, e),
        }
    }
    Ok(ranking)
}
