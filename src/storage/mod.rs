//! Storage abstractions for the ranking document.
//!
//! The document is a single JSON file replaced wholesale on every write:
//!
//! ```text
//! app/data/
//! └── ranking.json    # { generatedAt, source, strict, minLikes, pages, ranking }
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RankingDocument;

// Re-export for convenience
pub use local::LocalStorage;

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    /// Number of ranked books written
    pub book_count: usize,
    /// Where the document landed
    pub location: String,
}

/// Trait for ranking document backends.
#[async_trait]
pub trait RankingStorage: Send + Sync {
    /// Replace the stored document.
    async fn write_document(&self, document: &RankingDocument) -> Result<WriteSummary>;

    /// Load the stored document, `None` when nothing has been written yet.
    async fn load_document(&self) -> Result<Option<RankingDocument>>;

    /// Human-readable location for log lines.
    fn location(&self) -> String;
}
