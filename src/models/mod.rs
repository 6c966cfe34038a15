// src/models/mod.rs

//! Domain models for the ranking pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod evidence;
mod item;
mod key;
mod ranking;

// Re-export all public types
pub use config::{
    ApiConfig, Config, ExtractionPolicy, FeedConfig, FetchConfig, MAX_PAGES, MAX_PER_PAGE,
    OutputConfig, RankingConfig,
};
pub use evidence::{Evidence, Matcher};
pub use item::CandidateItem;
pub use key::{BookKey, normalize_title};
pub use ranking::{BookAggregate, HealthStatus, RankingDocument, Source, timestamp};
