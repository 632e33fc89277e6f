/// Cache garbage collection
///
/// Deletion is only safe when the sync run is known to have enumerated
/// the complete valid set: every attempted source succeeded and the
/// retained set is non-empty. An empty or partial retained set must never
/// be read as "nothing is valid". The delete itself is serialized against
/// in-flight upsert batches by the store's write gate.
use std::collections::HashSet;

use crate::{db::CatalogStore, error::AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Cleanup was skipped; the cache is untouched
    Skipped,
    /// Cleanup ran; `deleted` rows were removed
    Completed { deleted: u64 },
}

#[derive(Clone)]
pub struct CacheReconciler {
    store: CatalogStore,
}

impl CacheReconciler {
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    /// Deletes cached videos absent from `retained_ids`, if it is safe to
    ///
    /// No-op (with a log line) whenever any source failed or the retained
    /// set is empty.
    pub async fn reconcile_if_complete(
        &self,
        attempted_sources: usize,
        succeeded_sources: usize,
        retained_ids: &HashSet<String>,
    ) -> AppResult<ReconcileOutcome> {
        if succeeded_sources != attempted_sources {
            tracing::info!(
                attempted = attempted_sources,
                succeeded = succeeded_sources,
                "Skipping cache cleanup: not every source synced"
            );
            return Ok(ReconcileOutcome::Skipped);
        }

        if retained_ids.is_empty() {
            tracing::warn!("Skipping cache cleanup: empty retained set would wipe the catalog");
            return Ok(ReconcileOutcome::Skipped);
        }

        let deleted = self.store.delete_videos_not_in(retained_ids).await?;

        tracing::info!(
            deleted = deleted,
            retained = retained_ids.len(),
            "Cache cleanup complete"
        );

        Ok(ReconcileOutcome::Completed { deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::init_schema;
    use crate::models::Video;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn seeded_store(ids: &[&str]) -> CatalogStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        let store = CatalogStore::new(pool);

        let videos: Vec<Video> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Video {
                id: id.to_string(),
                title: id.to_string(),
                description: String::new(),
                thumbnail_url: String::new(),
                channel_title: String::new(),
                published_at: "2024-01-01T00:00:00Z".to_string(),
                duration: None,
                watched: false,
                added_at: i as i64,
            })
            .collect();
        store.upsert_videos(&videos).await.unwrap();
        store
    }

    fn id_set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_reconcile_deletes_complement_when_all_succeeded() {
        let store = seeded_store(&["a", "b", "c"]).await;
        let reconciler = CacheReconciler::new(store.clone());

        let outcome = reconciler
            .reconcile_if_complete(2, 2, &id_set(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Completed { deleted: 1 });
        let remaining: Vec<String> = store
            .get_all_videos()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert!(remaining.contains(&"a".to_string()));
        assert!(remaining.contains(&"b".to_string()));
        assert!(!remaining.contains(&"c".to_string()));
    }

    #[tokio::test]
    async fn test_reconcile_skips_on_partial_failure() {
        let store = seeded_store(&["a", "b"]).await;
        let reconciler = CacheReconciler::new(store.clone());

        let outcome = reconciler
            .reconcile_if_complete(3, 2, &id_set(&["a"]))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Skipped);
        assert_eq!(store.get_all_videos().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reconcile_skips_on_empty_retained_set() {
        // Even with every source reporting success, an empty retained set
        // must not wipe the cache.
        let store = seeded_store(&["a", "b"]).await;
        let reconciler = CacheReconciler::new(store.clone());

        let outcome = reconciler
            .reconcile_if_complete(2, 2, &HashSet::new())
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Skipped);
        assert_eq!(store.get_all_videos().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reconcile_retaining_everything_deletes_nothing() {
        let store = seeded_store(&["a", "b"]).await;
        let reconciler = CacheReconciler::new(store.clone());

        let outcome = reconciler
            .reconcile_if_complete(1, 1, &id_set(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Completed { deleted: 0 });
        assert_eq!(store.get_all_videos().await.unwrap().len(), 2);
    }
}
