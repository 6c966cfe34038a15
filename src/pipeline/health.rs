// src/pipeline/health.rs

//! Health summary over the stored ranking.

use crate::error::Result;
use crate::models::HealthStatus;
use crate::storage::RankingStorage;

/// Summarize the stored document.
///
/// An unreadable document reports `count: 0` instead of failing, mirroring
/// what the display page shows in that state.
pub async fn run_health(storage: &dyn RankingStorage) -> Result<HealthStatus> {
    let document = match storage.load_document().await {
        Ok(document) => document,
        Err(e) => {
            log::warn!("Unreadable ranking at {}: {}", storage.location(), e);
            None
        }
    };
    Ok(HealthStatus::from_document(document.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    async fn health_of(contents: Option<&str>) -> HealthStatus {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ranking.json");
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        run_health(&LocalStorage::new(&path)).await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_file() {
        let status = health_of(None).await;
        assert!(status.ok);
        assert!(!status.has_ranking);
        assert_eq!(status.count, 0);
        assert_eq!(status.generated_at, None);
    }

    #[tokio::test]
    async fn test_populated_file() {
        let status = health_of(Some(
            r#"{"generatedAt": "2024-01-01T00:00:00.000Z", "ranking": [{"id": "a"}, {"id": "b"}]}"#,
        ))
        .await;
        assert!(status.has_ranking);
        assert_eq!(status.count, 2);
        assert_eq!(status.generated_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_non_array_ranking_counts_zero() {
        let status = health_of(Some(r#"{"generatedAt": "x", "ranking": {"oops": 1}}"#)).await;
        assert_eq!(status.count, 0);
        assert!(!status.has_ranking);
        assert_eq!(status.generated_at.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_corrupt_file_counts_zero() {
        let status = health_of(Some("{broken")).await;
        assert!(status.ok);
        assert_eq!(status.count, 0);
    }

    #[test]
    fn test_health_json_shape() {
        let json = serde_json::to_value(HealthStatus::from_document(None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ok": true, "hasRanking": false, "count": 0, "generatedAt": null})
        );
    }
}
