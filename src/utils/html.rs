// src/utils/html.rs

//! Flatten rendered HTML into scannable text.

use scraper::{Html, Selector};

/// Convert an HTML fragment into whitespace-normalized visible text, followed
/// by every `href` found on anchors.
///
/// Link targets are appended so URL-borne identifiers (Amazon product links)
/// remain visible to the evidence extractor.
pub fn flatten(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let text = fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    let hrefs: Vec<&str> = match Selector::parse("a[href]") {
        Ok(sel) => fragment
            .select(&sel)
            .filter_map(|a| a.value().attr("href"))
            .collect(),
        Err(_) => Vec::new(),
    };

    if hrefs.is_empty() {
        text
    } else {
        format!("{}\n{}", text, hrefs.join("\n"))
    }
}
