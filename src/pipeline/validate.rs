// src/pipeline/validate.rs

//! Validate configuration and the stored ranking document.

use std::collections::HashSet;

use crate::error::{AppError, Result};
use crate::models::{Config, RankingDocument};
use crate::storage::RankingStorage;
use crate::utils::isbn;

/// List every integrity problem in a stored document.
pub fn check_document(document: &RankingDocument) -> Vec<String> {
    let mut problems = Vec::new();
    let mut ids = HashSet::new();

    for (index, book) in document.ranking.iter().enumerate() {
        let at = format!("ranking[{index}] ({})", book.id);

        if book.id.is_empty() {
            problems.push(format!("{at}: empty id"));
        } else if !ids.insert(book.id.as_str()) {
            problems.push(format!("{at}: duplicate id"));
        }
        if book.mentions as usize != book.sources.len() {
            problems.push(format!(
                "{at}: mentions={} but {} sources",
                book.mentions,
                book.sources.len()
            ));
        }
        let likes: u64 = book.sources.iter().map(|s| s.likes).sum();
        if likes != book.total_likes {
            problems.push(format!(
                "{at}: totalLikes={} but sources sum to {likes}",
                book.total_likes
            ));
        }
        let stocks: u64 = book.sources.iter().map(|s| s.stocks).sum();
        if stocks != book.total_stocks {
            problems.push(format!(
                "{at}: totalStocks={} but sources sum to {stocks}",
                book.total_stocks
            ));
        }
        if let Some(value) = book.isbn.as_deref().filter(|v| !isbn::is_valid_isbn(v)) {
            problems.push(format!("{at}: invalid isbn {value}"));
        }
        if let Some(value) = book.asin.as_deref().filter(|v| !is_asin(v)) {
            problems.push(format!("{at}: malformed asin {value}"));
        }
    }

    problems
}

fn is_asin(value: &str) -> bool {
    value.len() == 10
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}

/// Validate the effective configuration, then the stored document if present.
pub async fn run_validate(config: &Config, storage: &dyn RankingStorage) -> Result<()> {
    log::info!("Validating configuration...");
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("✓ Config OK");
    log::info!("  api: {} pages={} per_page={}", config.api.base_url, config.api.pages, config.api.per_page);
    log::info!("  feeds: {}", config.feeds.urls.len());
    log::info!(
        "  policy: strict={} require_context={} accept_asin={} window={}",
        config.policy.strict,
        config.policy.require_context,
        config.policy.accept_asin,
        config.policy.context_window
    );
    log::info!("  minLikes: {}", config.ranking.min_likes);
    log::info!("  output: {}", storage.location());

    let Some(document) = storage.load_document().await? else {
        log::info!("No ranking document yet");
        return Ok(());
    };

    let problems = check_document(&document);
    if problems.is_empty() {
        log::info!("✓ Ranking OK ({} books)", document.ranking.len());
        return Ok(());
    }

    for problem in &problems {
        log::warn!("{}", problem);
    }
    Err(AppError::validation(format!(
        "{} problem(s) in {}",
        problems.len(),
        storage.location()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookAggregate, Source};
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn source(likes: u64, stocks: u64) -> Source {
        Source {
            url: "https://qiita.com/u/items/x".into(),
            likes,
            stocks,
            ..Default::default()
        }
    }

    fn consistent(id: &str) -> BookAggregate {
        BookAggregate {
            id: id.into(),
            title: "t".into(),
            isbn: Some("9780306406157".into()),
            mentions: 2,
            total_likes: 15,
            total_stocks: 3,
            sources: vec![source(10, 1), source(5, 2)],
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_document_has_no_problems() {
        let doc = RankingDocument {
            ranking: vec![consistent("a"), consistent("b")],
            ..Default::default()
        };
        assert!(check_document(&doc).is_empty());
    }

    #[test]
    fn test_detects_broken_invariants() {
        let mut bad = consistent("a");
        bad.mentions = 3;
        bad.total_likes = 99;
        bad.isbn = Some("9780306406158".into());
        bad.asin = Some("b00short".into());

        let doc = RankingDocument {
            ranking: vec![bad, consistent("a")],
            ..Default::default()
        };
        let problems = check_document(&doc);
        assert_eq!(problems.len(), 5);
        assert!(problems.iter().any(|p| p.contains("duplicate id")));
        assert!(problems.iter().any(|p| p.contains("invalid isbn")));
    }

    #[tokio::test]
    async fn test_run_validate() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("ranking.json"));
        let config = Config::default();

        assert!(run_validate(&config, &storage).await.is_ok());

        let mut bad = consistent("a");
        bad.total_stocks = 0;
        let doc = RankingDocument {
            ranking: vec![bad],
            ..Default::default()
        };
        storage.write_document(&doc).await.unwrap();
        assert!(matches!(
            run_validate(&config, &storage).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_run_validate_rejects_bad_config() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("ranking.json"));
        let mut config = Config::default();
        config.fetch.timeout_secs = 0;
        assert!(run_validate(&config, &storage).await.is_err());
    }
}
