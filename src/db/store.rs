use std::collections::HashSet;
use std::sync::Arc;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::models::{Playlist, Video};

/// Local catalog cache backed by SQLite
///
/// All writers upsert by id, so concurrent syncs of different playlists
/// cannot corrupt each other's rows. Each upsert call commits as a single
/// transaction; a reader never observes a half-written batch. Video upserts
/// and the reconcile delete additionally share one lock: a cleanup can
/// never interleave with an in-flight upsert batch and remove rows that
/// batch just wrote.
#[derive(Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Upserts a batch of videos atomically
    ///
    /// Remote-owned columns are refreshed; `watched` and `added_at` are
    /// locally owned and kept from the existing row on conflict.
    pub async fn upsert_videos(&self, videos: &[Video]) -> AppResult<()> {
        if videos.is_empty() {
            return Ok(());
        }

        let _guard = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        for video in videos {
            sqlx::query(
                r#"
                INSERT INTO videos
                    (id, title, description, thumbnail_url, channel_title,
                     published_at, duration, watched, added_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    thumbnail_url = excluded.thumbnail_url,
                    channel_title = excluded.channel_title,
                    published_at = excluded.published_at,
                    duration = excluded.duration
                "#,
            )
            .bind(&video.id)
            .bind(&video.title)
            .bind(&video.description)
            .bind(&video.thumbnail_url)
            .bind(&video.channel_title)
            .bind(&video.published_at)
            .bind(&video.duration)
            .bind(video.watched)
            .bind(video.added_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(count = videos.len(), "Upserted videos");

        Ok(())
    }

    /// Upserts playlist rows, refreshing metadata and `last_sync_time`
    pub async fn upsert_playlists(&self, playlists: &[Playlist]) -> AppResult<()> {
        if playlists.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for playlist in playlists {
            sqlx::query(
                r#"
                INSERT INTO playlists
                    (id, title, description, thumbnail_url, item_count, last_sync_time)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    thumbnail_url = excluded.thumbnail_url,
                    item_count = excluded.item_count,
                    last_sync_time = excluded.last_sync_time
                "#,
            )
            .bind(&playlist.id)
            .bind(&playlist.title)
            .bind(&playlist.description)
            .bind(&playlist.thumbnail_url)
            .bind(playlist.item_count)
            .bind(playlist.last_sync_time)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Deletes every cached video whose id is not in `retained_ids`
    ///
    /// Returns the number of rows removed. The safety decision of whether
    /// deletion is allowed at all belongs to the reconciler, not here.
    /// Waits on the shared write gate, so an upsert batch in flight
    /// completes before any of its rows can be judged stale.
    pub async fn delete_videos_not_in(&self, retained_ids: &HashSet<String>) -> AppResult<u64> {
        if retained_ids.is_empty() {
            // "NOT IN ()" is not valid SQL; an empty set would also mean
            // wiping the table, which the reconciler never asks for.
            return Ok(0);
        }

        let _guard = self.write_gate.lock().await;
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM videos WHERE id NOT IN (");
        let mut separated = builder.separated(", ");
        for id in retained_ids {
            separated.push_bind(id);
        }
        builder.push(")");

        let result = builder.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    /// All cached videos, most recently added first
    pub async fn get_all_videos(&self) -> AppResult<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT id, title, description, thumbnail_url, channel_title, \
             published_at, duration, watched, added_at \
             FROM videos ORDER BY added_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    pub async fn get_all_playlists(&self) -> AppResult<Vec<Playlist>> {
        let playlists = sqlx::query_as::<_, Playlist>(
            "SELECT id, title, description, thumbnail_url, item_count, last_sync_time \
             FROM playlists",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(playlists)
    }

    /// Flips the locally owned watched flag; returns false if the id is unknown
    pub async fn set_watched(&self, video_id: &str, watched: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE videos SET watched = ? WHERE id = ?")
            .bind(watched)
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
