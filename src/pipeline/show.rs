// src/pipeline/show.rs

//! Print the stored ranking.

use crate::error::Result;
use crate::models::BookAggregate;
use crate::storage::RankingStorage;

/// Order used by the display page: total likes, then mentions, both descending.
pub fn display_order(ranking: &[BookAggregate]) -> Vec<&BookAggregate> {
    let mut ordered: Vec<&BookAggregate> = ranking.iter().collect();
    ordered.sort_by(|a, b| {
        b.total_likes
            .cmp(&a.total_likes)
            .then_with(|| b.mentions.cmp(&a.mentions))
    });
    ordered
}

/// Log up to `limit` entries of the stored ranking. Returns how many were shown.
pub async fn run_show(storage: &dyn RankingStorage, limit: usize) -> Result<usize> {
    let Some(document) = storage.load_document().await? else {
        log::info!("No ranking found at {}", storage.location());
        return Ok(0);
    };

    log::info!(
        "Ranking generated at {} ({} books, {} mentions)",
        document.generated_at.as_deref().unwrap_or("unknown"),
        document.ranking.len(),
        document.mention_count()
    );

    let shown: Vec<_> = display_order(&document.ranking)
        .into_iter()
        .take(limit)
        .collect();

    for (rank, book) in shown.iter().enumerate() {
        let id = book
            .isbn
            .as_deref()
            .map(|v| format!("isbn {v}"))
            .or_else(|| book.asin.as_deref().map(|v| format!("asin {v}")))
            .unwrap_or_else(|| "no identifier".to_string());
        log::info!(
            "{:>3}. {} [{}] likes={} stocks={} mentions={}",
            rank + 1,
            book.title,
            id,
            book.total_likes,
            book.total_stocks,
            book.mentions
        );
        for source in &book.sources {
            log::debug!("       {} ({} likes)", source.url, source.likes);
        }
    }

    Ok(shown.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RankingDocument;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn book(id: &str, likes: u64, mentions: u64) -> BookAggregate {
        BookAggregate {
            id: id.into(),
            title: id.into(),
            total_likes: likes,
            mentions,
            ..Default::default()
        }
    }

    #[test]
    fn test_display_order() {
        let ranking = vec![book("a", 5, 1), book("b", 9, 1), book("c", 9, 3), book("d", 5, 1)];
        let ids: Vec<_> = display_order(&ranking).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a", "d"]);
    }

    #[tokio::test]
    async fn test_show_respects_limit() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("ranking.json"));
        assert_eq!(run_show(&storage, 10).await.unwrap(), 0);

        let doc = RankingDocument {
            ranking: vec![book("a", 1, 1), book("b", 2, 1), book("c", 3, 1)],
            ..Default::default()
        };
        storage.write_document(&doc).await.unwrap();
        assert_eq!(run_show(&storage, 2).await.unwrap(), 2);
        assert_eq!(run_show(&storage, 10).await.unwrap(), 3);
    }
}
