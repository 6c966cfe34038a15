// src/pipeline/postfilter.rs

//! Re-validate a stored ranking: drop entries whose ISBN fails the checksum.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{RankingDocument, timestamp};
use crate::storage::RankingStorage;
use crate::utils::isbn;

/// Entry counts before and after a post-filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostfilterReport {
    pub input: usize,
    pub output: usize,
}

/// Keep only entries with a valid ISBN, re-sort by total likes and restamp.
///
/// The sort is stable, so a second pass over the output changes nothing but
/// `generatedAt`.
pub fn postfilter(
    mut document: RankingDocument,
    now: DateTime<Utc>,
) -> (RankingDocument, PostfilterReport) {
    let input = document.ranking.len();

    document.ranking.retain(|book| {
        let keep = book.isbn.as_deref().is_some_and(isbn::is_valid_isbn);
        if !keep {
            log::debug!("Dropping {} ({}): isbn={:?}", book.id, book.title, book.isbn);
        }
        keep
    });
    document
        .ranking
        .sort_by(|a, b| b.total_likes.cmp(&a.total_likes));
    document.generated_at = Some(timestamp(now));

    let report = PostfilterReport {
        input,
        output: document.ranking.len(),
    };
    (document, report)
}

/// Load, filter and rewrite the stored document.
pub async fn run_postfilter(storage: &dyn RankingStorage) -> Result<PostfilterReport> {
    let Some(document) = storage.load_document().await? else {
        return Err(AppError::config(format!(
            "No ranking document at {}. Run 'collect' first.",
            storage.location()
        )));
    };

    let (document, report) = postfilter(document, Utc::now());
    storage.write_document(&document).await?;

    log::info!("postfilter: in={} out={}", report.input, report.output);
    Ok(report)
}
