// src/error.rs

//! Unified error handling for the ranking pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Exit code used when a run finished but produced no ranked books.
pub const EXIT_EMPTY_RANKING: i32 = 2;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Feed document could not be parsed
    #[cfg(feature = "rss")]
    #[error("Feed parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Fetching from an item source failed
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// The run completed but no book qualified
    #[error("No books found (minLikes={min_likes}, pages={pages})")]
    EmptyRanking { min_likes: u64, pages: u32 },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EmptyRanking { .. } => EXIT_EMPTY_RANKING,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ranking_has_distinct_exit_code() {
        let err = AppError::EmptyRanking {
            min_likes: 5,
            pages: 3,
        };
        assert_eq!(err.exit_code(), EXIT_EMPTY_RANKING);
        assert_eq!(AppError::config("boom").exit_code(), 1);
    }

    #[test]
    fn fetch_error_carries_context() {
        let err = AppError::fetch("page 2", "timed out");
        assert_eq!(err.to_string(), "Fetch error for page 2: timed out");
    }
}
