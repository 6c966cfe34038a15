// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

use crate::error::Result;

/// Join an API base URL and a relative endpoint path, then attach query pairs.
///
/// # Examples
/// ```
/// use bookrank::utils::url::endpoint;
///
/// let url = endpoint("https://qiita.com/api/v2", "items", &[("page", "2")]).unwrap();
/// assert_eq!(url, "https://qiita.com/api/v2/items?page=2");
/// ```
pub fn endpoint(base: &str, path: &str, query: &[(&str, &str)]) -> Result<String> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined)?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter().copied());
    }
    Ok(url.to_string())
}

/// Resolve a possibly relative link against the document it appeared in.
pub fn resolve(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(href) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => Url::parse(base).ok()?.join(href).ok().map(|u| u.to_string()),
    }
}

/// Extract domain from a URL.
pub fn get_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
}

/// Extract the article id from a Qiita article URL
/// (`https://qiita.com/<user>/items/<id>`).
pub fn extract_article_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    if host != "qiita.com" && !host.ends_with(".qiita.com") {
        return None;
    }

    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [_, "items", id, ..] if id.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Some((*id).to_string())
        }
        _ => None,
    }
}
