// src/services/aggregator.rs

//! Per-book aggregation and ranking.

use std::collections::HashMap;

use crate::models::{BookAggregate, BookKey, CandidateItem, Evidence, RankingConfig, Source};

/// Accumulates qualifying items into per-book aggregates.
///
/// The map lives for exactly one run: create an aggregator, feed it every
/// item in discovery order, then call [`Aggregator::finish`].
#[derive(Debug)]
pub struct Aggregator {
    min_likes: u64,
    stock_weight: f64,
    mention_bonus: f64,
    index: HashMap<BookKey, usize>,
    entries: Vec<Entry>,
}

#[derive(Debug)]
struct Entry {
    book: BookAggregate,
    /// Representative title came from a quoted title rather than an item title
    quoted_title: bool,
}

impl Aggregator {
    /// Create an empty aggregator with the given threshold and score weights.
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            min_likes: config.min_likes,
            stock_weight: config.stock_weight,
            mention_bonus: config.mention_bonus,
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Aggregate a batch of items with their evidence in one pass.
    pub fn aggregate<'a, I>(config: &RankingConfig, items: I) -> Vec<BookAggregate>
    where
        I: IntoIterator<Item = (&'a CandidateItem, &'a Evidence)>,
    {
        let mut aggregator = Self::new(config);
        for (item, evidence) in items {
            aggregator.add(item, evidence);
        }
        aggregator.finish()
    }

    /// Add one item. Returns `false` when the item is below the like threshold.
    pub fn add(&mut self, item: &CandidateItem, evidence: &Evidence) -> bool {
        let likes = item.likes_or_zero();
        if likes < self.min_likes {
            return false;
        }
        let stocks = item.stocks_or_zero();

        let quoted = evidence.title.as_deref().filter(|t| t.chars().count() >= 2);
        let title = quoted.unwrap_or(&item.title);
        let key = BookKey::derive(evidence, title);

        let source = Source {
            url: item.url.clone(),
            title: item.title.clone(),
            likes,
            stocks,
            platform_id: (!item.id.is_empty()).then(|| item.id.clone()),
        };

        match self.index.get(&key) {
            Some(&at) => {
                let entry = &mut self.entries[at];
                if let Some(q) = quoted.filter(|_| !entry.quoted_title) {
                    entry.book.title = q.to_string();
                    entry.quoted_title = true;
                }
                let book = &mut entry.book;
                book.mentions += 1;
                book.total_likes += likes;
                book.total_stocks += stocks;
                book.sources.push(source);
                book.rescore(self.stock_weight, self.mention_bonus);
            }
            None => {
                let mut book = BookAggregate {
                    id: key.synthetic_id(),
                    title: title.to_string(),
                    asin: evidence.asin.clone(),
                    isbn: evidence.isbn.clone(),
                    mentions: 1,
                    score: 0.0,
                    total_likes: likes,
                    total_stocks: stocks,
                    sources: vec![source],
                    ..Default::default()
                };
                book.rescore(self.stock_weight, self.mention_bonus);
                log::debug!("New book {} ({}) via {}", key, book.title, evidence.matcher);

                self.index.insert(key, self.entries.len());
                self.entries.push(Entry {
                    book,
                    quoted_title: quoted.is_some(),
                });
            }
        }
        true
    }

    /// Number of distinct books so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalize into the ranking order.
    pub fn finish(self) -> Vec<BookAggregate> {
        let mut ranking: Vec<BookAggregate> = self.entries.into_iter().map(|e| e.book).collect();
        ranking.sort_by(BookAggregate::rank_cmp);
        ranking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Matcher;

    fn item(id: &str, title: &str, likes: u64, stocks: u64) -> CandidateItem {
        CandidateItem {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://qiita.com/u/items/{id}"),
            likes: Some(likes),
            stocks: Some(stocks),
            platform: "qiita".to_string(),
            ..Default::default()
        }
    }

    fn isbn(v: &str) -> Evidence {
        Evidence::isbn(v.to_string(), true, Matcher::LabeledIsbn)
    }

    fn config() -> RankingConfig {
        RankingConfig::default()
    }

    #[test]
    fn test_extracted_quoted_title_names_the_book() {
        use crate::models::ExtractionPolicy;
        use crate::services::EvidenceExtractor;

        let mut a = item("a", "今月読んだ本まとめ", 10, 0);
        a.body = "『リーダブルコード』 ISBN 978-4-87311-565-8 を読んだ".into();
        let ev = EvidenceExtractor::new(ExtractionPolicy::default())
            .extract(&a.scan_text())
            .unwrap();

        let ranking = Aggregator::aggregate(&config(), [(&a, &ev)]);
        assert_eq!(ranking[0].title, "リーダブルコード");
        assert_eq!(ranking[0].sources[0].title, "今月読んだ本まとめ");
    }

    #[test]
    fn test_same_isbn_merges() {
        let a = item("a", "Readable Code", 10, 4);
        let b = item("b", "リーダブルコードを読んだ", 7, 1);
        let ev = isbn("9784873115658");

        let ranking = Aggregator::aggregate(&config(), [(&a, &ev), (&b, &ev)]);
        assert_eq!(ranking.len(), 1);

        let book = &ranking[0];
        assert_eq!(book.mentions, 2);
        assert_eq!(book.total_likes, 17);
        assert_eq!(book.total_stocks, 5);
        assert_eq!(book.sources.len(), 2);
        assert_eq!(book.sources[0].platform_id.as_deref(), Some("a"));
        assert_eq!(book.title, "Readable Code");
        assert_eq!(book.isbn.as_deref(), Some("9784873115658"));
        assert!((book.score - (17.0 + 5.0 * 0.7 + 2.0 * 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_invariants_hold() {
        let items: Vec<_> = (0..5)
            .map(|i| item(&format!("i{i}"), "t", 5 + i, i))
            .collect();
        let ev = isbn("9780306406157");
        let ranking = Aggregator::aggregate(&config(), items.iter().map(|i| (i, &ev)));
        let book = &ranking[0];
        assert_eq!(book.mentions as usize, book.sources.len());
        assert_eq!(book.total_likes, book.sources.iter().map(|s| s.likes).sum::<u64>());
        assert_eq!(book.total_stocks, book.sources.iter().map(|s| s.stocks).sum::<u64>());
    }

    #[test]
    fn test_below_threshold_is_dropped() {
        let mut agg = Aggregator::new(&config());
        assert!(!agg.add(&item("a", "t", 4, 100), &isbn("9780306406157")));
        assert!(agg.is_empty());
        assert!(agg.finish().is_empty());
    }

    #[test]
    fn test_missing_likes_count_as_zero() {
        let mut rss = item("r", "t", 0, 0);
        rss.likes = None;
        let mut agg = Aggregator::new(&RankingConfig {
            min_likes: 0,
            ..config()
        });
        assert!(agg.add(&rss, &isbn("9780306406157")));
        assert_eq!(agg.finish()[0].total_likes, 0);
    }

    #[test]
    fn test_isbn_and_asin_groups_stay_apart() {
        let a = item("a", "Foo", 10, 0);
        let b = item("b", "Foo (2nd ed.)", 10, 0);
        let ev_a = isbn("9780306406157");
        let ev_b = Evidence::asin("B00ABCDEFG".to_string());
        let ranking = Aggregator::aggregate(&config(), [(&a, &ev_a), (&b, &ev_b)]);
        assert_eq!(ranking.len(), 2);
    }

    #[test]
    fn test_title_keys_merge_across_editions() {
        let a = item("a", "Foo", 10, 0);
        let b = item("b", "Foo (Revised Edition)", 8, 0);
        let ev = Evidence::publisher();
        let ranking = Aggregator::aggregate(&config(), [(&a, &ev), (&b, &ev)]);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].mentions, 2);
        assert_eq!(ranking[0].title, "Foo");
    }

    #[test]
    fn test_quoted_title_becomes_representative() {
        let a = item("a", "今月読んだ本まとめ", 10, 0);
        let b = item("b", "書評", 10, 0);
        let ev_a = isbn("9784873115658");
        let mut ev_b = isbn("9784873115658");
        ev_b.title = Some("リーダブルコード".to_string());

        let ranking = Aggregator::aggregate(&config(), [(&a, &ev_a), (&b, &ev_b)]);
        assert_eq!(ranking[0].title, "リーダブルコード");
        assert_eq!(ranking[0].sources[0].title, "今月読んだ本まとめ");
    }

    #[test]
    fn test_ranking_order_is_deterministic() {
        let items = vec![
            (item("a", "A", 10, 0), isbn("9780306406157")),
            (item("b", "B", 10, 5), isbn("9784873115658")),
            (item("c", "C", 30, 0), Evidence::asin("B00ABCDEFG".into())),
            (item("d", "D", 10, 0), Evidence::asin("B00ZZZZZZZ".into())),
        ];
        let run = || {
            Aggregator::aggregate(&config(), items.iter().map(|(i, e)| (i, e)))
                .into_iter()
                .map(|b| b.id)
                .collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first, run());

        let ranking = Aggregator::aggregate(&config(), items.iter().map(|(i, e)| (i, e)));
        assert_eq!(ranking[0].title, "C");
        assert_eq!(ranking[1].title, "B");
    }

    #[test]
    fn test_all_below_threshold_yields_empty() {
        let items: Vec<_> = (0..3).map(|i| item(&format!("{i}"), "t", 1, 50)).collect();
        let ev = isbn("9780306406157");
        let ranking = Aggregator::aggregate(&config(), items.iter().map(|i| (i, &ev)));
        assert!(ranking.is_empty());
    }
}
