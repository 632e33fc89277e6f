/// Full-library sync orchestration
///
/// One run enumerates the user's playlists, syncs each of them plus the
/// subscription feed, and only then considers cleaning up stale cache
/// rows. Per-source failures degrade the run instead of aborting it; the
/// reconciler refuses cleanup unless every source succeeded.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::{Playlist, SyncReport},
    services::ingestion::IngestionPipeline,
    services::reconciler::{CacheReconciler, ReconcileOutcome},
    services::youtube::VideoSource,
};

#[derive(Clone)]
pub struct SyncService {
    source: Arc<dyn VideoSource>,
    pipeline: IngestionPipeline,
    reconciler: CacheReconciler,
    store: CatalogStore,
}

impl SyncService {
    pub fn new(
        source: Arc<dyn VideoSource>,
        pipeline: IngestionPipeline,
        reconciler: CacheReconciler,
        store: CatalogStore,
    ) -> Self {
        Self {
            source,
            pipeline,
            reconciler,
            store,
        }
    }

    /// Syncs the whole library: every playlist plus the subscription feed
    ///
    /// The subscription feed counts as one source next to the playlists.
    /// Cleanup of cache rows absent from this run only happens when all
    /// sources succeeded and at least one video survived.
    pub async fn sync_all(&self, auth_token: &str) -> AppResult<SyncReport> {
        let run_id = Uuid::new_v4();
        tracing::info!(run_id = %run_id, "Starting full-library sync");

        let playlists = self.source.list_my_playlists(auth_token).await?;
        self.refresh_playlists(&playlists).await?;

        let attempted = playlists.len() + 1;
        let mut succeeded = 0usize;
        let mut retained: HashSet<String> = HashSet::new();

        for playlist in &playlists {
            match self
                .pipeline
                .sync_playlist(&playlist.id, Some(auth_token))
                .await
            {
                Ok(ids) => {
                    succeeded += 1;
                    retained.extend(ids);
                }
                Err(e) => {
                    tracing::warn!(
                        run_id = %run_id,
                        playlist_id = %playlist.id,
                        error = %e,
                        "Playlist sync failed"
                    );
                }
            }
        }

        match self.pipeline.sync_subscription_feed(auth_token).await {
            Ok(ids) => {
                succeeded += 1;
                retained.extend(ids);
            }
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "Subscription feed sync failed");
            }
        }

        let outcome = self
            .reconciler
            .reconcile_if_complete(attempted, succeeded, &retained)
            .await?;

        let report = SyncReport {
            attempted_sources: attempted,
            succeeded_sources: succeeded,
            synced_videos: retained.len(),
            reconciled: matches!(outcome, ReconcileOutcome::Completed { .. }),
        };

        tracing::info!(
            run_id = %run_id,
            attempted = report.attempted_sources,
            succeeded = report.succeeded_sources,
            videos = report.synced_videos,
            reconciled = report.reconciled,
            "Full-library sync finished"
        );

        Ok(report)
    }

    /// Syncs one playlist on its own
    ///
    /// Covers only part of the catalog, so no cleanup runs here. Returns
    /// the number of videos written.
    pub async fn sync_one_playlist(
        &self,
        playlist_id: &str,
        auth_token: Option<&str>,
    ) -> AppResult<usize> {
        let ids = self.pipeline.sync_playlist(playlist_id, auth_token).await?;
        Ok(ids.len())
    }

    async fn refresh_playlists(
        &self,
        remote: &[crate::services::youtube::RemotePlaylist],
    ) -> AppResult<()> {
        let now = Utc::now().timestamp_millis();
        let playlists: Vec<Playlist> = remote
            .iter()
            .map(|p| Playlist {
                id: p.id.clone(),
                title: p.title.clone(),
                description: p.description.clone(),
                thumbnail_url: p.thumbnail_url.clone(),
                item_count: p.item_count,
                last_sync_time: now,
            })
            .collect();
        self.store.upsert_playlists(&playlists).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::init_schema;
    use crate::error::AppError;
    use crate::services::youtube::{
        FetchedVideo, MockVideoSource, PlaylistItemsPage, RemotePlaylist, SubscriptionsPage,
    };
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::HashMap;

    async fn memory_store() -> CatalogStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        CatalogStore::new(pool)
    }

    fn fetched(id: &str) -> FetchedVideo {
        FetchedVideo {
            id: id.to_string(),
            title: format!("Title {}", id),
            description: String::new(),
            thumbnail_url: String::new(),
            channel_title: "Channel".to_string(),
            published_at: "2024-05-01T00:00:00Z".to_string(),
        }
    }

    fn remote_playlist(id: &str) -> RemotePlaylist {
        RemotePlaylist {
            id: id.to_string(),
            title: format!("Playlist {}", id),
            description: None,
            thumbnail_url: None,
            item_count: 1,
        }
    }

    fn empty_subscriptions(source: &mut MockVideoSource) {
        source
            .expect_list_subscriptions()
            .returning(|_, _| {
                Ok(SubscriptionsPage {
                    channels: Vec::new(),
                    next_page_token: None,
                })
            });
    }

    fn service(source: MockVideoSource, store: CatalogStore) -> SyncService {
        let source: Arc<dyn VideoSource> = Arc::new(source);
        let pipeline = IngestionPipeline::new(source.clone(), store.clone());
        let reconciler = CacheReconciler::new(store.clone());
        SyncService::new(source, pipeline, reconciler, store)
    }

    #[tokio::test]
    async fn test_sync_all_reports_and_reconciles() {
        let store = memory_store().await;
        // A stale row from a previous run; this run must clean it up.
        store
            .upsert_videos(&[crate::models::Video {
                id: "stale".to_string(),
                title: "Stale".to_string(),
                description: String::new(),
                thumbnail_url: String::new(),
                channel_title: String::new(),
                published_at: "2024-01-01T00:00:00Z".to_string(),
                duration: Some("PT5M".to_string()),
                watched: false,
                added_at: 1,
            }])
            .await
            .unwrap();

        let mut source = MockVideoSource::new();
        source
            .expect_list_my_playlists()
            .returning(|_| Ok(vec![remote_playlist("p1")]));
        source.expect_list_playlist_items().returning(|_, _, _| {
            Ok(PlaylistItemsPage {
                items: vec![fetched("v1")],
                next_page_token: None,
            })
        });
        source.expect_get_video_durations().returning(|ids, _| {
            Ok(ids
                .iter()
                .map(|id| (id.clone(), "PT10M".to_string()))
                .collect::<HashMap<_, _>>())
        });
        empty_subscriptions(&mut source);

        let service = service(source, store.clone());
        let report = service.sync_all("token").await.unwrap();

        assert_eq!(report.attempted_sources, 2);
        assert_eq!(report.succeeded_sources, 2);
        assert_eq!(report.synced_videos, 1);
        assert!(report.reconciled);

        let ids: Vec<String> = store
            .get_all_videos()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec!["v1".to_string()]);

        let playlists = store.get_all_playlists().await.unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].id, "p1");
        assert!(playlists[0].last_sync_time > 0);
    }

    #[tokio::test]
    async fn test_failed_playlist_degrades_run_and_skips_cleanup() {
        let store = memory_store().await;
        store
            .upsert_videos(&[crate::models::Video {
                id: "keepme".to_string(),
                title: "Keep".to_string(),
                description: String::new(),
                thumbnail_url: String::new(),
                channel_title: String::new(),
                published_at: "2024-01-01T00:00:00Z".to_string(),
                duration: Some("PT5M".to_string()),
                watched: false,
                added_at: 1,
            }])
            .await
            .unwrap();

        let mut source = MockVideoSource::new();
        source
            .expect_list_my_playlists()
            .returning(|_| Ok(vec![remote_playlist("p1"), remote_playlist("p2")]));
        source
            .expect_list_playlist_items()
            .returning(|playlist_id, _, _| {
                if playlist_id == "p2" {
                    return Err(AppError::ExternalApi("listing broke".to_string()));
                }
                Ok(PlaylistItemsPage {
                    items: vec![fetched("v1")],
                    next_page_token: None,
                })
            });
        source.expect_get_video_durations().returning(|ids, _| {
            Ok(ids
                .iter()
                .map(|id| (id.clone(), "PT10M".to_string()))
                .collect::<HashMap<_, _>>())
        });
        empty_subscriptions(&mut source);

        let service = service(source, store.clone());
        let report = service.sync_all("token").await.unwrap();

        assert_eq!(report.attempted_sources, 3);
        assert_eq!(report.succeeded_sources, 2);
        assert!(!report.reconciled);

        // The row absent from this partial run survives.
        let ids: Vec<String> = store
            .get_all_videos()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert!(ids.contains(&"keepme".to_string()));
        assert!(ids.contains(&"v1".to_string()));
    }

    #[tokio::test]
    async fn test_playlist_enumeration_failure_is_hard() {
        let store = memory_store().await;
        let mut source = MockVideoSource::new();
        source
            .expect_list_my_playlists()
            .returning(|_| Err(AppError::Unauthorized("token rejected".to_string())));

        let service = service(source, store);
        let result = service.sync_all("bad-token").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_sync_one_playlist_counts_without_cleanup() {
        let store = memory_store().await;
        store
            .upsert_videos(&[crate::models::Video {
                id: "other".to_string(),
                title: "Other".to_string(),
                description: String::new(),
                thumbnail_url: String::new(),
                channel_title: String::new(),
                published_at: "2024-01-01T00:00:00Z".to_string(),
                duration: Some("PT5M".to_string()),
                watched: false,
                added_at: 1,
            }])
            .await
            .unwrap();

        let mut source = MockVideoSource::new();
        source.expect_list_playlist_items().returning(|_, _, _| {
            Ok(PlaylistItemsPage {
                items: vec![fetched("v1"), fetched("v2")],
                next_page_token: None,
            })
        });
        source.expect_get_video_durations().returning(|ids, _| {
            Ok(ids
                .iter()
                .map(|id| (id.clone(), "PT10M".to_string()))
                .collect::<HashMap<_, _>>())
        });

        let service = service(source, store.clone());
        let synced = service.sync_one_playlist("p1", None).await.unwrap();

        assert_eq!(synced, 2);
        // Rows from other sources are untouched.
        assert_eq!(store.get_all_videos().await.unwrap().len(), 3);
    }
}
