// src/pipeline/collect.rs

//! Collection pipeline: sources → evidence → aggregation → document.

use std::collections::HashSet;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{CandidateItem, Config, RankingDocument};
use crate::services::{Aggregator, EvidenceExtractor, ItemSource};
use crate::storage::RankingStorage;

/// Counters reported at the end of a collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    /// Unique items after cross-source de-duplication
    pub items: usize,
    /// Items for which evidence was found
    pub with_evidence: usize,
    /// Items that passed the like threshold and were aggregated
    pub qualifying: usize,
    /// Distinct ranked books
    pub books: usize,
    /// Where the document was written
    pub location: String,
}

/// Collapse items seen through several sources; the first occurrence wins.
pub fn dedupe(items: Vec<CandidateItem>) -> Vec<CandidateItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.canonical_id()))
        .collect()
}

/// Run one collection and replace the stored ranking.
///
/// Fails with [`AppError::EmptyRanking`] when no book qualifies; the stored
/// document is then left untouched unless `output.write_empty` is set.
pub async fn run_collect(
    config: &Config,
    sources: &[Box<dyn ItemSource>],
    storage: &dyn RankingStorage,
) -> Result<CollectSummary> {
    let pages = config.api.pages;
    let min_likes = config.ranking.min_likes;

    log::info!(
        "Collecting from {} source(s): pages={}, minLikes={}, strict={}",
        sources.len(),
        pages,
        min_likes,
        config.policy.strict
    );

    let mut fetched = Vec::new();
    let mut used = Vec::new();
    for source in sources {
        match source.fetch_candidates(pages, min_likes).await {
            Ok(items) => {
                log::info!("{}: {} candidate items", source.name(), items.len());
                fetched.extend(items);
                used.push(source.name().to_string());
            }
            Err(e) => log::warn!("Source {} failed: {}", source.name(), e),
        }
    }

    let items = dedupe(fetched);
    let extractor = EvidenceExtractor::new(config.policy.clone());
    log::debug!("Extraction policy: {:?}", extractor.policy());
    let mut aggregator = Aggregator::new(&config.ranking);
    let mut summary = CollectSummary {
        items: items.len(),
        ..CollectSummary::default()
    };

    for item in &items {
        let Some(evidence) = extractor.extract(&item.scan_text()) else {
            log::debug!("No book evidence in {} ({})", item.id, item.url);
            continue;
        };
        summary.with_evidence += 1;
        if aggregator.add(item, &evidence) {
            summary.qualifying += 1;
        }
    }

    let ranking = aggregator.finish();
    summary.books = ranking.len();

    let document = RankingDocument::new(
        used,
        config.policy.strict,
        min_likes,
        pages,
        ranking,
        Utc::now(),
    );

    if document.ranking.is_empty() {
        log::warn!(
            "No books found (items={}, withEvidence={}). Try lowering MIN_LIKES or increasing QIITA_PAGES.",
            summary.items,
            summary.with_evidence
        );
        if config.output.write_empty {
            storage.write_document(&document).await?;
            log::info!("Wrote empty ranking to {}", storage.location());
        } else {
            log::info!("Keeping existing ranking at {}", storage.location());
        }
        return Err(AppError::EmptyRanking { min_likes, pages });
    }

    let written = storage.write_document(&document).await?;
    summary.location = written.location;

    log::info!(
        "Saved {} -> books={}, items={}, qualifying={}",
        summary.location,
        summary.books,
        summary.items,
        summary.qualifying
    );

    Ok(summary)
}
