// src/services/extractor.rs

//! Evidence extraction.
//!
//! Scans free text for signals that an article references a specific book.
//! Matchers run in a fixed precedence order and the first success wins:
//!
//! 1. `ISBN`-labeled identifiers (ISBN-13, then ISBN-10)
//! 2. Unlabeled 978/979 thirteen-digit runs
//! 3. Amazon product URLs (only with `accept_asin`)
//! 4. Quoted titles, then publisher domains (only without `strict`)
//!
//! Within a matcher, the first left-to-right candidate that validates wins.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::{Evidence, ExtractionPolicy, Matcher};
use crate::utils::isbn;

static LABELED_ISBN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ISBN(?:-?1[03])?\s*[:：]?\s*([0-9][0-9\- ]{7,15}[0-9X])")
        .expect("labeled isbn pattern is valid")
});

static BARE_ISBN13: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"97[89](?:[\- ]?[0-9]){10}").expect("bare isbn pattern is valid")
});

static AMAZON_ASIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)https?://(?:www\.)?amazon\.[a-z.]+/(?:[^\s"'<>]*?/)?"#,
        r#"(?:dp|gp/product|exec/obidos/ASIN)/([A-Z0-9]{10})(?:[/?#"'<>)\s]|$)"#,
    ))
    .expect("amazon pattern is valid")
});

static QUOTED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"「([^「」\n]{2,120})」|『([^『』\n]{2,120})』").expect("quote pattern is valid")
});

static BOOKISH_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)技術書|書評|レビュー|読んだ|入門|実践|独習|詳解|教科書|徹底解説|図解|逆引き",
        r"|第\s*\d+\s*版|改訂|新版|新訂",
        r"|\bintroduction\b|\bpractical\b|complete guide|\bcookbook\b|\bhandbook\b",
        r"|\bin action\b|\b\d+(?:st|nd|rd|th) edition\b",
    ))
    .expect("keyword pattern is valid")
});

/// CJK publisher names and book-genre words, matched as substrings.
const CONTEXT_HINTS: &[&str] = &[
    "書",
    "本",
    "入門",
    "大全",
    "実践",
    "第",
    "版",
    "改訂",
    "オライリー",
    "技術評論社",
    "翔泳社",
    "インプレス",
    "マイナビ",
    "sbクリエイティブ",
    "ソフトバンククリエイティブ",
    "日経bp",
    "秀和システム",
    "朝日新聞出版",
    "講談社",
];

/// Latin-script hints; only whole words count (`Notebook` is not `book`).
static ASCII_HINTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"isbn|o'?reilly|books?|editions?|publishers?|manning|packt|no starch",
        r"|pragmatic bookshelf|addison-wesley|apress|kindaipubl|gijutsu hyouron",
    ))
    .expect("hint pattern is valid")
});

/// Publisher domains accepted as evidence on their own in non-strict mode.
const PUBLISHER_DOMAINS: &[&str] = &[
    "oreilly.co.jp",
    "oreilly.com",
    "gihyo.jp",
    "shoeisha.co.jp",
    "seshop.com",
    "book.impress.co.jp",
    "book.mynavi.jp",
    "sbcr.jp",
    "nikkeibp.co.jp",
    "shuwasystem.co.jp",
    "lambdanote.com",
    "manning.com",
    "pragprog.com",
    "nostarch.com",
    "packtpub.com",
];

/// Policy-driven evidence extractor.
#[derive(Debug, Clone)]
pub struct EvidenceExtractor {
    policy: ExtractionPolicy,
}

impl EvidenceExtractor {
    /// Create an extractor with the given policy.
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ExtractionPolicy {
        &self.policy
    }

    /// Return the strongest available evidence in `text`, if any.
    ///
    /// Identifier evidence also picks up the first quoted title in the text.
    pub fn extract(&self, text: &str) -> Option<Evidence> {
        if text.trim().is_empty() {
            return None;
        }
        let mut evidence = Matcher::ORDER
            .into_iter()
            .filter(|m| self.enabled(*m))
            .find_map(|m| self.run(m, text))?;

        if evidence.title.is_none() && (evidence.isbn.is_some() || evidence.asin.is_some()) {
            evidence.title = first_quoted(text).map(String::from);
        }
        Some(evidence)
    }

    /// Whether a matcher participates under the current policy.
    pub fn enabled(&self, matcher: Matcher) -> bool {
        match matcher {
            Matcher::LabeledIsbn | Matcher::BareIsbn13 => true,
            Matcher::AmazonAsin => self.policy.accept_asin,
            Matcher::QuotedTitle | Matcher::PublisherDomain => !self.policy.strict,
        }
    }

    fn run(&self, matcher: Matcher, text: &str) -> Option<Evidence> {
        match matcher {
            Matcher::LabeledIsbn => labeled_isbn(text),
            Matcher::BareIsbn13 => self.bare_isbn13(text),
            Matcher::AmazonAsin => amazon_asin(text),
            Matcher::QuotedTitle => quoted_title(text),
            Matcher::PublisherDomain => publisher_domain(text),
        }
    }

    fn bare_isbn13(&self, text: &str) -> Option<Evidence> {
        for m in BARE_ISBN13.find_iter(text) {
            if touches_digit(text, m.start(), m.end()) {
                continue;
            }
            let isbn = isbn::normalize(m.as_str());
            if !isbn::is_valid_isbn13(&isbn) {
                continue;
            }

            let hinted = has_context(text, m.start(), m.end(), self.policy.context_window);
            if hinted || !self.policy.require_context {
                return Some(Evidence::isbn(isbn, hinted, Matcher::BareIsbn13));
            }
            log::debug!("Bare ISBN {} rejected: no supporting context", isbn);
        }
        None
    }
}

/// The `ISBN` label itself satisfies the context requirement.
fn labeled_isbn(text: &str) -> Option<Evidence> {
    LABELED_ISBN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|run| {
            labeled_candidates(run.as_str())
                .map(isbn::normalize)
                .find(|v| isbn::is_valid_isbn13(v) || isbn::is_valid_isbn10(v))
        })
        .map(|isbn| Evidence::isbn(isbn, true, Matcher::LabeledIsbn))
}

/// The captured run, then shorter prefixes cut at spaces.
///
/// The label pattern may swallow a trailing number separated by a space
/// (`ISBN 4873115655 2012`); shorter prefixes recover the identifier.
fn labeled_candidates(run: &str) -> impl Iterator<Item = &str> {
    std::iter::once(run).chain(
        run.rmatch_indices(' ')
            .map(move |(i, _)| run[..i].trim_end())
            .filter(|s| !s.is_empty()),
    )
}

/// Whether the match is glued to a longer digit run.
fn touches_digit(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before.is_some_and(|c| c.is_ascii_digit()) || after.is_some_and(|c| c.is_ascii_digit())
}

/// Slice of `text` spanning `radius` graphemes on each side of `start..end`.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start]
        .grapheme_indices(true)
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .grapheme_indices(true)
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    &text[from..to]
}

fn has_context(text: &str, start: usize, end: usize, radius: usize) -> bool {
    let window = context_window(text, start, end, radius).to_lowercase();
    CONTEXT_HINTS.iter().any(|hint| window.contains(hint))
        || ASCII_HINTS
            .find_iter(&window)
            .any(|m| !touches_word(&window, m.start(), m.end()))
}

/// Whether the match continues into a longer Latin word.
fn touches_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before.is_some_and(|c| c.is_ascii_alphanumeric())
        || after.is_some_and(|c| c.is_ascii_alphanumeric())
}

fn first_quoted(text: &str) -> Option<&str> {
    QUOTED_TITLE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim())
        .find(|t| t.chars().count() >= 2)
}

fn amazon_asin(text: &str) -> Option<Evidence> {
    AMAZON_ASIN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| Evidence::asin(m.as_str().to_ascii_uppercase()))
}

fn quoted_title(text: &str) -> Option<Evidence> {
    if !BOOKISH_KEYWORDS.is_match(text) {
        return None;
    }
    first_quoted(text).map(|t| Evidence::quoted_title(t.to_string()))
}

fn publisher_domain(text: &str) -> Option<Evidence> {
    let lowered = text.to_lowercase();
    PUBLISHER_DOMAINS
        .iter()
        .any(|domain| lowered.contains(domain))
        .then(Evidence::publisher)
}
