//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Hard ceiling on listing pages fetched per run.
pub const MAX_PAGES: u32 = 10;

/// Hard ceiling on items per listing page accepted by the upstream API.
pub const MAX_PER_PAGE: u32 = 100;

/// Root application configuration.
///
/// Built once at the process boundary (file, then environment, then CLI flags)
/// and passed down by reference.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upstream article API
    #[serde(default)]
    pub api: ApiConfig,

    /// Optional RSS/Atom feeds
    #[serde(default)]
    pub feeds: FeedConfig,

    /// Evidence extraction policy flags
    #[serde(default)]
    pub policy: ExtractionPolicy,

    /// Qualification threshold and score weights
    #[serde(default)]
    pub ranking: RankingConfig,

    /// HTTP behavior settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Where the ranking document is written
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an environment-style lookup.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("QIITA_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.api.token = Some(token);
        }
        if let Some(v) = parse_env(&lookup, "MIN_LIKES") {
            self.ranking.min_likes = v;
        }
        if let Some(v) = parse_env(&lookup, "QIITA_PAGES") {
            self.api.pages = v;
        }
        if let Some(v) = parse_env_bool(&lookup, "STRICT") {
            self.policy.strict = v;
        }
        if let Some(v) = parse_env_bool(&lookup, "REQUIRE_CONTEXT") {
            self.policy.require_context = v;
        }
        if let Some(v) = parse_env_bool(&lookup, "ACCEPT_ASIN") {
            self.policy.accept_asin = v;
        }
        if let Some(path) = lookup("RANKING_OUTPUT").filter(|p| !p.trim().is_empty()) {
            self.output.path = PathBuf::from(path);
        }
        self.clamp();
    }

    /// Clamp bounded values into their documented ranges.
    pub fn clamp(&mut self) {
        let pages = self.api.pages.clamp(1, MAX_PAGES);
        if pages != self.api.pages {
            log::warn!(
                "api.pages={} out of range, clamped to {}",
                self.api.pages,
                pages
            );
            self.api.pages = pages;
        }
        let per_page = self.api.per_page.clamp(1, MAX_PER_PAGE);
        if per_page != self.api.per_page {
            log::warn!(
                "api.per_page={} out of range, clamped to {}",
                self.api.per_page,
                per_page
            );
            self.api.per_page = per_page;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(AppError::validation("fetch.max_concurrent must be > 0"));
        }
        if !(1..=MAX_PAGES).contains(&self.api.pages) {
            return Err(AppError::validation(format!(
                "api.pages must be within 1..={MAX_PAGES}"
            )));
        }
        if !(1..=MAX_PER_PAGE).contains(&self.api.per_page) {
            return Err(AppError::validation(format!(
                "api.per_page must be within 1..={MAX_PER_PAGE}"
            )));
        }
        url::Url::parse(&self.api.base_url)
            .map_err(|e| AppError::validation(format!("api.base_url: {e}")))?;
        for feed in &self.feeds.urls {
            url::Url::parse(feed)
                .map_err(|e| AppError::validation(format!("feed url {feed}: {e}")))?;
        }
        if self.policy.context_window == 0 {
            return Err(AppError::validation("policy.context_window must be > 0"));
        }
        if self.ranking.stock_weight < 0.0 || self.ranking.mention_bonus < 0.0 {
            return Err(AppError::validation("ranking weights must be >= 0"));
        }
        if self.output.path.as_os_str().is_empty() {
            return Err(AppError::validation("output.path is empty"));
        }
        Ok(())
    }
}

fn parse_env<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}

fn parse_env_bool<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            log::warn!("Ignoring {}={:?}: not a boolean", key, raw);
            None
        }
    }
}

/// Upstream article API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Platform name recorded in the ranking document
    #[serde(default = "defaults::platform")]
    pub platform: String,

    /// API root; listing is `{base_url}/items`, detail is `{base_url}/items/{id}`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Listing pages to fetch (1..=10)
    #[serde(default = "defaults::pages")]
    pub pages: u32,

    /// Items per listing page (1..=100)
    #[serde(default = "defaults::per_page")]
    pub per_page: u32,

    /// Optional search query passed to the listing endpoint
    #[serde(default)]
    pub query: Option<String>,

    /// Optional bearer token
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Fetch per-item detail bodies for items passing the like prefilter
    #[serde(default = "defaults::yes")]
    pub fetch_bodies: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            platform: defaults::platform(),
            base_url: defaults::base_url(),
            pages: defaults::pages(),
            per_page: defaults::per_page(),
            query: None,
            token: None,
            fetch_bodies: true,
        }
    }
}

/// RSS/Atom feed source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed URLs; empty disables the feed source
    #[serde(default)]
    pub urls: Vec<String>,

    /// Cross-reference entries pointing at API articles to obtain engagement counts
    #[serde(default = "defaults::yes")]
    pub enrich: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            enrich: true,
        }
    }
}

/// Policy flags for the evidence extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionPolicy {
    /// Require identifier evidence; disables title/publisher heuristics
    #[serde(default = "defaults::yes")]
    pub strict: bool,

    /// Require a publisher or genre hint near an ISBN candidate
    #[serde(default = "defaults::yes")]
    pub require_context: bool,

    /// Accept Amazon product codes when no ISBN is found
    #[serde(default)]
    pub accept_asin: bool,

    /// Context window radius in characters on each side of a candidate
    #[serde(default = "defaults::context_window")]
    pub context_window: usize,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            strict: true,
            require_context: true,
            accept_asin: false,
            context_window: defaults::context_window(),
        }
    }
}

/// Qualification threshold and score weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Minimum likes an item needs to count as a mention
    #[serde(default = "defaults::min_likes")]
    pub min_likes: u64,

    /// Weight applied to total stocks in the score
    #[serde(default = "defaults::stock_weight")]
    pub stock_weight: f64,

    /// Bonus per mention in the score
    #[serde(default = "defaults::mention_bonus")]
    pub mention_bonus: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_likes: defaults::min_likes(),
            stock_weight: defaults::stock_weight(),
            mention_bonus: defaults::mention_bonus(),
        }
    }
}

/// HTTP client and fetching behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between listing page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent detail requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Extra attempts for a failed listing page
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base backoff between listing retries in milliseconds
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            max_retries: defaults::max_retries(),
            retry_backoff_ms: defaults::retry_backoff(),
        }
    }
}

/// Output document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the ranking document
    #[serde(default = "defaults::output_path")]
    pub path: PathBuf,

    /// Overwrite the document even when a run produced no books
    #[serde(default)]
    pub write_empty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
            write_empty: false,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn yes() -> bool {
        true
    }

    // Api defaults
    pub fn platform() -> String {
        "qiita".into()
    }
    pub fn base_url() -> String {
        "https://qiita.com/api/v2".into()
    }
    pub fn pages() -> u32 {
        3
    }
    pub fn per_page() -> u32 {
        100
    }

    // Policy defaults
    pub fn context_window() -> usize {
        100
    }

    // Ranking defaults
    pub fn min_likes() -> u64 {
        5
    }
    pub fn stock_weight() -> f64 {
        0.7
    }
    pub fn mention_bonus() -> f64 {
        3.0
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        "techbooks-collector (bookrank/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn max_retries() -> u32 {
        2
    }
    pub fn retry_backoff() -> u64 {
        500
    }

    // Output defaults
    pub fn output_path() -> PathBuf {
        PathBuf::from("app/data/ranking.json")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn defaults_match_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.ranking.min_likes, 5);
        assert_eq!(config.api.pages, 3);
        assert!(config.policy.strict);
        assert!(config.policy.require_context);
        assert!(!config.policy.accept_asin);
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.fetch.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_feed_url() {
        let mut config = Config::default();
        config.feeds.urls.push("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_are_applied() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("QIITA_TOKEN", "abc"),
            ("MIN_LIKES", "10"),
            ("QIITA_PAGES", "7"),
            ("STRICT", "false"),
            ("ACCEPT_ASIN", "yes"),
            ("RANKING_OUTPUT", "out/ranking.json"),
        ]));
        assert_eq!(config.api.token.as_deref(), Some("abc"));
        assert_eq!(config.ranking.min_likes, 10);
        assert_eq!(config.api.pages, 7);
        assert!(!config.policy.strict);
        assert!(config.policy.accept_asin);
        assert_eq!(config.output.path, PathBuf::from("out/ranking.json"));
    }

    #[test]
    fn env_pages_are_clamped() {
        let mut config = Config::default();
        config.apply_env(env(&[("QIITA_PAGES", "50")]));
        assert_eq!(config.api.pages, MAX_PAGES);

        config.apply_env(env(&[("QIITA_PAGES", "0")]));
        assert_eq!(config.api.pages, 1);
    }

    #[test]
    fn env_garbage_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("MIN_LIKES", "lots"), ("STRICT", "maybe")]));
        assert_eq!(config.ranking.min_likes, 5);
        assert!(config.policy.strict);
    }

    #[test]
    fn load_reads_file_and_rejects_bad_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bookrank.toml");

        std::fs::write(&path, "[ranking]\nmin_likes = 12\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().ranking.min_likes, 12);

        std::fs::write(&path, "[ranking\n").unwrap();
        assert!(matches!(Config::load(&path), Err(AppError::Toml(_))));
        assert!(Config::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn toml_sections_parse_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            pages = 5
            query = "title:技術書"

            [policy]
            strict = false

            [feeds]
            urls = ["https://qiita.com/popular-items/feed"]
            "#,
        )
        .unwrap();
        assert_eq!(config.api.pages, 5);
        assert_eq!(config.api.per_page, 100);
        assert!(!config.policy.strict);
        assert!(config.policy.require_context);
        assert_eq!(config.feeds.urls.len(), 1);
        assert!(config.feeds.enrich);
    }
}
