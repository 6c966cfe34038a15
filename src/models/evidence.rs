//! Evidence extracted from an item's text.

use std::fmt;

/// Matcher strategy that produced a piece of evidence, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Matcher {
    /// `ISBN`-labeled identifier
    LabeledIsbn,
    /// Unlabeled 978/979 thirteen-digit run
    BareIsbn13,
    /// Amazon product URL
    AmazonAsin,
    /// Title between full-width quotes near a book-ish keyword
    QuotedTitle,
    /// Known publisher domain mentioned in the text
    PublisherDomain,
}

impl Matcher {
    /// All matchers in precedence order.
    pub const ORDER: [Matcher; 5] = [
        Matcher::LabeledIsbn,
        Matcher::BareIsbn13,
        Matcher::AmazonAsin,
        Matcher::QuotedTitle,
        Matcher::PublisherDomain,
    ];
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Matcher::LabeledIsbn => "labeled-isbn",
            Matcher::BareIsbn13 => "bare-isbn13",
            Matcher::AmazonAsin => "amazon-asin",
            Matcher::QuotedTitle => "quoted-title",
            Matcher::PublisherDomain => "publisher-domain",
        };
        f.write_str(name)
    }
}

/// Result of scanning one item's text.
///
/// An item without evidence is never turned into a book record, so an
/// `Evidence` value always carries at least one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    /// Normalized, checksum-valid ISBN-13 or ISBN-10
    pub isbn: Option<String>,
    /// Uppercase 10-character Amazon product code
    pub asin: Option<String>,
    /// Title found between full-width quotes
    pub title: Option<String>,
    /// A publisher or book-genre hint was seen near the match
    pub publisher_context: bool,
    /// Strategy that produced this evidence
    pub matcher: Matcher,
}

impl Evidence {
    pub fn isbn(isbn: String, publisher_context: bool, matcher: Matcher) -> Self {
        Self {
            isbn: Some(isbn),
            asin: None,
            title: None,
            publisher_context,
            matcher,
        }
    }

    pub fn asin(asin: String) -> Self {
        Self {
            isbn: None,
            asin: Some(asin),
            title: None,
            publisher_context: false,
            matcher: Matcher::AmazonAsin,
        }
    }

    pub fn quoted_title(title: String) -> Self {
        Self {
            isbn: None,
            asin: None,
            title: Some(title),
            publisher_context: false,
            matcher: Matcher::QuotedTitle,
        }
    }

    pub fn publisher() -> Self {
        Self {
            isbn: None,
            asin: None,
            title: None,
            publisher_context: true,
            matcher: Matcher::PublisherDomain,
        }
    }
}
