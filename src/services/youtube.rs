/// YouTube Data API v3 accessor
///
/// Thin and retry-free: every method is one HTTP call (plus pagination
/// driven by the caller via page tokens). The trait is the seam the
/// ingestion pipeline is tested through.
use std::collections::HashMap;

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::youtube::{
        ChannelListResponse, PlaylistItem, PlaylistItemsResponse, PlaylistListResponse,
        SubscriptionListResponse, VideoListResponse,
    },
};

/// Fixed page size of the listing endpoints
pub const PAGE_SIZE: u32 = 50;
/// Maximum ids accepted by one `videos.list` detail call
pub const DETAIL_BATCH_SIZE: usize = 50;

/// A listed video before duration enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub channel_title: String,
    pub published_at: String,
}

#[derive(Debug, Clone)]
pub struct PlaylistItemsPage {
    pub items: Vec<FetchedVideo>,
    pub next_page_token: Option<String>,
}

/// A followed channel from the subscription listing
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct SubscriptionsPage {
    pub channels: Vec<ChannelRef>,
    pub next_page_token: Option<String>,
}

/// A playlist as listed by the remote API
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlaylist {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub item_count: i64,
}

/// Remote content API contract consumed by the ingestion pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VideoSource: Send + Sync {
    /// One page of a playlist's items
    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        auth_token: Option<String>,
        page_token: Option<String>,
    ) -> AppResult<PlaylistItemsPage>;

    /// Durations for up to [`DETAIL_BATCH_SIZE`] video ids
    async fn get_video_durations(
        &self,
        ids: &[String],
        auth_token: Option<String>,
    ) -> AppResult<HashMap<String, String>>;

    /// The authenticated user's playlists (paged internally to exhaustion)
    async fn list_my_playlists(&self, auth_token: &str) -> AppResult<Vec<RemotePlaylist>>;

    /// One page of the authenticated user's subscriptions
    async fn list_subscriptions(
        &self,
        auth_token: &str,
        page_token: Option<String>,
    ) -> AppResult<SubscriptionsPage>;

    /// Canonical uploads playlist for a channel, if the channel exposes one
    async fn resolve_uploads_playlist(&self, channel_id: &str) -> AppResult<Option<String>>;
}

#[derive(Clone)]
pub struct YouTubeClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        auth_token: Option<&str>,
    ) -> AppResult<T> {
        let url = format!("{}/{}", self.api_url, path);

        let mut request = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())]);
        if let Some(token) = auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "YouTube API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// Converts one playlist item into a fetched video, skipping items without
/// a video id or snippet (deleted/private videos appear that way).
fn fetched_video_from_item(item: PlaylistItem) -> Option<FetchedVideo> {
    let snippet = item.snippet?;
    let id = snippet.resource_id.video_id.clone()?;

    // The video's own publish time is in contentDetails; the snippet's
    // publishedAt is when the item joined the playlist.
    let published_at = item
        .content_details
        .and_then(|d| d.video_published_at)
        .or(snippet.published_at)
        .unwrap_or_default();

    Some(FetchedVideo {
        id,
        title: snippet.title,
        description: snippet.description.unwrap_or_default(),
        thumbnail_url: snippet
            .thumbnails
            .and_then(|t| t.best_url())
            .unwrap_or_default(),
        channel_title: snippet.video_owner_channel_title.unwrap_or_default(),
        published_at,
    })
}

#[async_trait::async_trait]
impl VideoSource for YouTubeClient {
    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        auth_token: Option<String>,
        page_token: Option<String>,
    ) -> AppResult<PlaylistItemsPage> {
        let max_results = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(ref token) = page_token {
            query.push(("pageToken", token.as_str()));
        }

        let response: PlaylistItemsResponse = self
            .get_json("playlistItems", &query, auth_token.as_deref())
            .await?;

        Ok(PlaylistItemsPage {
            items: response
                .items
                .into_iter()
                .filter_map(fetched_video_from_item)
                .collect(),
            next_page_token: response.next_page_token,
        })
    }

    async fn get_video_durations(
        &self,
        ids: &[String],
        auth_token: Option<String>,
    ) -> AppResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        if ids.len() > DETAIL_BATCH_SIZE {
            return Err(AppError::InvalidInput(format!(
                "Detail lookup limited to {} ids, got {}",
                DETAIL_BATCH_SIZE,
                ids.len()
            )));
        }

        let joined = ids.join(",");
        let query = vec![("part", "contentDetails"), ("id", joined.as_str())];

        let response: VideoListResponse = self
            .get_json("videos", &query, auth_token.as_deref())
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| {
                let duration = item.content_details.and_then(|d| d.duration)?;
                Some((item.id, duration))
            })
            .collect())
    }

    async fn list_my_playlists(&self, auth_token: &str) -> AppResult<Vec<RemotePlaylist>> {
        let mut playlists = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let max_results = PAGE_SIZE.to_string();
            let mut query = vec![
                ("part", "snippet,contentDetails"),
                ("mine", "true"),
                ("maxResults", max_results.as_str()),
            ];
            if let Some(ref token) = page_token {
                query.push(("pageToken", token.as_str()));
            }

            let response: PlaylistListResponse = self
                .get_json("playlists", &query, Some(auth_token))
                .await?;

            for item in response.items {
                let snippet = match item.snippet {
                    Some(s) => s,
                    None => continue,
                };
                playlists.push(RemotePlaylist {
                    id: item.id,
                    title: snippet.title,
                    description: snippet.description,
                    thumbnail_url: snippet.thumbnails.and_then(|t| t.best_url()),
                    item_count: item
                        .content_details
                        .and_then(|d| d.item_count)
                        .unwrap_or(0),
                });
            }

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(playlists)
    }

    async fn list_subscriptions(
        &self,
        auth_token: &str,
        page_token: Option<String>,
    ) -> AppResult<SubscriptionsPage> {
        let max_results = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("mine", "true"),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(ref token) = page_token {
            query.push(("pageToken", token.as_str()));
        }

        let response: SubscriptionListResponse = self
            .get_json("subscriptions", &query, Some(auth_token))
            .await?;

        let channels = response
            .items
            .into_iter()
            .filter_map(|sub| {
                let snippet = sub.snippet?;
                let id = snippet.resource_id.channel_id?;
                Some(ChannelRef {
                    id,
                    title: snippet.title,
                })
            })
            .collect();

        Ok(SubscriptionsPage {
            channels,
            next_page_token: response.next_page_token,
        })
    }

    async fn resolve_uploads_playlist(&self, channel_id: &str) -> AppResult<Option<String>> {
        let query = vec![("part", "contentDetails"), ("id", channel_id)];

        let response: ChannelListResponse = self.get_json("channels", &query, None).await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|c| c.content_details)
            .and_then(|d| d.related_playlists)
            .and_then(|p| p.uploads))
    }
}
