use serde::{Deserialize, Serialize};

pub mod gemini;
pub mod youtube;

/// A cached video from the remote catalog
///
/// `watched` and `added_at` are locally owned: sync upserts refresh every
/// other column but never touch these two. `duration` stays `None` until the
/// enrichment pass succeeds for the video, which is distinct from a duration
/// that classified as unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub channel_title: String,
    /// ISO-8601 UTC timestamp; fixed-width, so lexicographic order is
    /// chronological order
    pub published_at: String,
    pub duration: Option<String>,
    pub watched: bool,
    /// Local insertion time in epoch millis, the display-order key
    pub added_at: i64,
}

/// A fetchable playlist as last reported by the remote API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub item_count: i64,
    pub last_sync_time: i64,
}

/// One video reference from the model's structured answer
///
/// Ephemeral: produced by stream extraction, consumed by hydration, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSuggestion {
    pub item_id: String,
    pub reason: String,
}

/// A suggestion resolved against the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub video: Video,
    pub reason: String,
}

/// Outcome of a full-library sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub attempted_sources: usize,
    pub succeeded_sources: usize,
    pub synced_videos: usize,
    pub reconciled: bool,
}
