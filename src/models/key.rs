//! Book identity key derivation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::models::Evidence;

/// Edition qualifiers stripped from titles before grouping.
static EDITION_QUALIFIERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)",
        r"\b(?:revised|updated|expanded|new|second|third|fourth|fifth)\s+edition\b",
        r"|\b\d+(?:st|nd|rd|th)\s*ed(?:ition\b|\.|\b)",
        r"|\bed(?:ition|\.)?\s*\d+\b",
        r"|\brevised\b",
        r"|第\s*\d+\s*版",
        r"|改訂新版|改訂第?\d*版|増補改訂版|増補版|改訂|新版|新訂",
    ))
    .expect("edition qualifier pattern is valid")
});

/// Grouping key for one book. Precedence: ISBN, then ASIN, then title.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BookKey {
    Isbn(String),
    Asin(String),
    Title(String),
}

impl BookKey {
    /// Derive the key from evidence, falling back to `title` when no identifier
    /// is present.
    pub fn derive(evidence: &Evidence, title: &str) -> Self {
        if let Some(isbn) = &evidence.isbn {
            return BookKey::Isbn(isbn.clone());
        }
        if let Some(asin) = &evidence.asin {
            return BookKey::Asin(asin.clone());
        }
        BookKey::Title(normalize_title(title))
    }

    /// Stable synthetic id: first 16 bytes of the SHA-256 of the key, in hex.
    pub fn synthetic_id(&self) -> String {
        let digest = Sha256::digest(self.to_string().as_bytes());
        hex::encode(&digest[..16])
    }
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookKey::Isbn(v) => write!(f, "isbn:{v}"),
            BookKey::Asin(v) => write!(f, "asin:{v}"),
            BookKey::Title(v) => write!(f, "title:{v}"),
        }
    }
}

/// Lowercase, drop edition qualifiers and punctuation, collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = EDITION_QUALIFIERS.replace_all(&lowered, " ");
    stripped
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
