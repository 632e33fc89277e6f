//! Typed response records for the YouTube Data API v3.
//!
//! Every field the API may omit is an `Option`; the ingestion pipeline
//! decides per call site whether a missing field is a skip or a default.

use serde::Deserialize;

/// Response from `GET /playlistItems`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemsResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    #[serde(default)]
    pub snippet: Option<PlaylistItemSnippet>,
    #[serde(default)]
    pub content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnails: Option<Thumbnails>,
    /// Channel that owns the video (not the playlist)
    #[serde(default)]
    pub video_owner_channel_title: Option<String>,
    /// Time the item was added to the playlist; the video's own publish time
    /// lives in `contentDetails.videoPublishedAt`
    #[serde(default)]
    pub published_at: Option<String>,
    pub resource_id: ResourceId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    #[serde(default)]
    pub video_published_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnails {
    #[serde(default)]
    pub default: Option<Thumbnail>,
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

impl Thumbnails {
    /// Best available thumbnail URL, preferring higher resolutions
    pub fn best_url(&self) -> Option<String> {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
    }
}

/// Response from `GET /videos` (the duration enrichment call)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoResource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResource {
    pub id: String,
    #[serde(default)]
    pub content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContentDetails {
    #[serde(default)]
    pub duration: Option<String>,
}

/// Response from `GET /playlists?mine=true`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResource {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<PlaylistSnippet>,
    #[serde(default)]
    pub content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnippet {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistContentDetails {
    #[serde(default)]
    pub item_count: Option<i64>,
}

/// Response from `GET /subscriptions?mine=true`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListResponse {
    #[serde(default)]
    pub items: Vec<Subscription>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub snippet: Option<SubscriptionSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnippet {
    pub title: String,
    pub resource_id: ResourceId,
}

/// Response from `GET /channels` (uploads-playlist resolution)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelResource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResource {
    #[serde(default)]
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    #[serde(default)]
    pub related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPlaylists {
    #[serde(default)]
    pub uploads: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_items_response_deserialization() {
        let json = r#"{
            "items": [{
                "snippet": {
                    "title": "Some upload",
                    "description": "About things",
                    "videoOwnerChannelTitle": "Some Channel",
                    "publishedAt": "2024-05-01T10:00:00Z",
                    "thumbnails": {
                        "medium": {"url": "https://i.ytimg.com/m.jpg"}
                    },
                    "resourceId": {"videoId": "abc123"}
                },
                "contentDetails": {"videoPublishedAt": "2024-04-30T09:00:00Z"}
            }],
            "nextPageToken": "CAUQAA"
        }"#;

        let response: PlaylistItemsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("CAUQAA"));
        assert_eq!(response.items.len(), 1);

        let snippet = response.items[0].snippet.as_ref().unwrap();
        assert_eq!(snippet.resource_id.video_id.as_deref(), Some("abc123"));
        assert_eq!(
            snippet.video_owner_channel_title.as_deref(),
            Some("Some Channel")
        );
        let details = response.items[0].content_details.as_ref().unwrap();
        assert_eq!(
            details.video_published_at.as_deref(),
            Some("2024-04-30T09:00:00Z")
        );
    }

    #[test]
    fn test_playlist_items_response_tolerates_missing_fields() {
        let json = r#"{"items": [{"snippet": {"title": "t", "resourceId": {}}}]}"#;
        let response: PlaylistItemsResponse = serde_json::from_str(json).unwrap();
        assert!(response.next_page_token.is_none());
        let snippet = response.items[0].snippet.as_ref().unwrap();
        assert!(snippet.resource_id.video_id.is_none());
        assert!(snippet.thumbnails.is_none());
    }

    #[test]
    fn test_thumbnails_best_url_prefers_high() {
        let thumbs = Thumbnails {
            default: Some(Thumbnail {
                url: "d".to_string(),
            }),
            medium: Some(Thumbnail {
                url: "m".to_string(),
            }),
            high: Some(Thumbnail {
                url: "h".to_string(),
            }),
        };
        assert_eq!(thumbs.best_url().as_deref(), Some("h"));
    }

    #[test]
    fn test_thumbnails_best_url_falls_back() {
        let thumbs = Thumbnails {
            default: Some(Thumbnail {
                url: "d".to_string(),
            }),
            medium: None,
            high: None,
        };
        assert_eq!(thumbs.best_url().as_deref(), Some("d"));
    }

    #[test]
    fn test_video_list_response_deserialization() {
        let json = r#"{
            "items": [
                {"id": "v1", "contentDetails": {"duration": "PT4M13S"}},
                {"id": "v2", "contentDetails": {}}
            ]
        }"#;
        let response: VideoListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(
            response.items[0]
                .content_details
                .as_ref()
                .unwrap()
                .duration
                .as_deref(),
            Some("PT4M13S")
        );
        assert!(response.items[1]
            .content_details
            .as_ref()
            .unwrap()
            .duration
            .is_none());
    }

    #[test]
    fn test_channel_list_response_uploads_playlist() {
        let json = r#"{
            "items": [{
                "contentDetails": {"relatedPlaylists": {"uploads": "UUxyz"}}
            }]
        }"#;
        let response: ChannelListResponse = serde_json::from_str(json).unwrap();
        let uploads = response.items[0]
            .content_details
            .as_ref()
            .and_then(|d| d.related_playlists.as_ref())
            .and_then(|p| p.uploads.clone());
        assert_eq!(uploads.as_deref(), Some("UUxyz"));
    }
}
