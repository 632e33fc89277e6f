/// Multi-stage ingestion: list, enrich, persist
///
/// Two sources feed the catalog: a single playlist, and the cross-channel
/// subscription feed. Listing failures are hard (the whole operation
/// aborts, so the caller never treats a partial listing as complete);
/// enrichment and per-channel failures are soft and only degrade the
/// result.
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::Video,
    services::duration::{classify, VideoLength},
    services::youtube::{FetchedVideo, VideoSource, DETAIL_BATCH_SIZE},
};

/// How many recent uploads to consider per subscribed channel
const RECENT_UPLOADS_PER_CHANNEL: usize = 10;
/// Global cap on subscription-feed candidates before enrichment
const SUBSCRIPTION_FEED_CAP: usize = 100;

#[derive(Clone)]
pub struct IngestionPipeline {
    source: Arc<dyn VideoSource>,
    store: CatalogStore,
}

impl IngestionPipeline {
    pub fn new(source: Arc<dyn VideoSource>, store: CatalogStore) -> Self {
        Self { source, store }
    }

    /// Syncs one playlist into the catalog
    ///
    /// Returns every video id that was part of the listing, including ids
    /// whose enrichment batch failed, so the caller can build the retained
    /// set for reconciliation.
    pub async fn sync_playlist(
        &self,
        playlist_id: &str,
        auth_token: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let mut fetched = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .source
                .list_playlist_items(playlist_id, auth_token.map(String::from), page_token.take())
                .await?;
            fetched.extend(page.items);

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        tracing::info!(
            playlist_id = %playlist_id,
            listed = fetched.len(),
            "Playlist listing complete"
        );

        let now = Utc::now().timestamp_millis();
        let mut videos: Vec<Video> = fetched.into_iter().map(|f| to_video(f, now)).collect();

        self.enrich_durations(&mut videos, auth_token).await;

        self.store.upsert_videos(&videos).await?;

        Ok(videos.into_iter().map(|v| v.id).collect())
    }

    /// Syncs the long-form subscription feed
    ///
    /// Candidates are narrowed to the global most-recent set before the
    /// batchable (and expensive) duration lookup, then shorts are dropped.
    pub async fn sync_subscription_feed(&self, auth_token: &str) -> AppResult<Vec<String>> {
        let mut channels = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .source
                .list_subscriptions(auth_token, page_token.take())
                .await?;
            channels.extend(page.channels);

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        tracing::info!(channels = channels.len(), "Subscription listing complete");

        let mut candidates: Vec<FetchedVideo> = Vec::new();
        for channel in &channels {
            // One broken channel must not abort the feed.
            let uploads_id = match self.source.resolve_uploads_playlist(&channel.id).await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    tracing::debug!(channel = %channel.title, "No uploads playlist");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(channel = %channel.title, error = %e, "Uploads resolution failed, skipping channel");
                    continue;
                }
            };

            match self
                .source
                .list_playlist_items(&uploads_id, Some(auth_token.to_string()), None)
                .await
            {
                Ok(page) => {
                    candidates.extend(page.items.into_iter().take(RECENT_UPLOADS_PER_CHANNEL));
                }
                Err(e) => {
                    tracing::warn!(channel = %channel.title, error = %e, "Uploads listing failed, skipping channel");
                }
            }
        }

        // Fixed-width UTC timestamps, so string order is publish order.
        // Id as tie-break keeps the cut at the cap independent of channel
        // iteration order.
        candidates.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(a.id.cmp(&b.id)));
        candidates.truncate(SUBSCRIPTION_FEED_CAP);

        let now = Utc::now().timestamp_millis();
        let mut videos: Vec<Video> = candidates.into_iter().map(|f| to_video(f, now)).collect();

        self.enrich_durations(&mut videos, Some(auth_token)).await;

        let before = videos.len();
        videos.retain(|v| classify(v.duration.as_deref()) == VideoLength::Long);

        tracing::info!(
            candidates = before,
            long_form = videos.len(),
            "Subscription feed filtered to long-form"
        );

        self.store.upsert_videos(&videos).await?;

        Ok(videos.into_iter().map(|v| v.id).collect())
    }

    /// Attaches durations in detail-lookup batches
    ///
    /// A failed batch leaves its videos un-enriched rather than dropping
    /// them.
    async fn enrich_durations(&self, videos: &mut [Video], auth_token: Option<&str>) {
        let ids: Vec<String> = videos.iter().map(|v| v.id.clone()).collect();
        let mut durations: HashMap<String, String> = HashMap::new();

        for batch in ids.chunks(DETAIL_BATCH_SIZE) {
            match self
                .source
                .get_video_durations(batch, auth_token.map(String::from))
                .await
            {
                Ok(found) => durations.extend(found),
                Err(e) => {
                    tracing::warn!(
                        batch_size = batch.len(),
                        error = %e,
                        "Duration enrichment batch failed, keeping videos without duration"
                    );
                }
            }
        }

        for video in videos.iter_mut() {
            if let Some(duration) = durations.get(&video.id) {
                video.duration = Some(duration.clone());
            }
        }
    }
}

fn to_video(fetched: FetchedVideo, added_at: i64) -> Video {
    Video {
        id: fetched.id,
        title: fetched.title,
        description: fetched.description,
        thumbnail_url: fetched.thumbnail_url,
        channel_title: fetched.channel_title,
        published_at: fetched.published_at,
        duration: None,
        watched: false,
        added_at,
    }
}
