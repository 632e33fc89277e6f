use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Playlist, Recommendation, SyncReport, Video},
    services::recommendations::RecommendationUpdate,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SetWatchedRequest {
    pub watched: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncPlaylistResponse {
    pub synced: usize,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
struct CompletePayload {
    answer: String,
    recommendations: Vec<Recommendation>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All cached videos, newest first
pub async fn get_videos(State(state): State<AppState>) -> AppResult<Json<Vec<Video>>> {
    let videos = state.store.get_all_videos().await?;
    Ok(Json(videos))
}

/// All cached playlists
pub async fn get_playlists(State(state): State<AppState>) -> AppResult<Json<Vec<Playlist>>> {
    let playlists = state.store.get_all_playlists().await?;
    Ok(Json(playlists))
}

/// Sets the watched flag on one video
pub async fn set_watched(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(request): Json<SetWatchedRequest>,
) -> AppResult<StatusCode> {
    let updated = state.store.set_watched(&video_id, request.watched).await?;
    if !updated {
        return Err(AppError::NotFound(format!("video {}", video_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Full-library sync; requires a bearer token
pub async fn sync_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SyncReport>> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    let report = state.sync.sync_all(token).await?;
    Ok(Json(report))
}

/// Single-playlist sync; the token is optional for public playlists
pub async fn sync_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    headers: HeaderMap,
) -> AppResult<Json<SyncPlaylistResponse>> {
    let synced = state
        .sync
        .sync_one_playlist(&playlist_id, bearer_token(&headers))
        .await?;
    Ok(Json(SyncPlaylistResponse { synced }))
}

/// Streams recommendation updates over SSE
///
/// `display` events carry the progressively assembled text; a single
/// terminal `complete` event carries the answer and the resolved videos.
pub async fn recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Sse<BoxStream<'static, Result<Event, Infallible>>>> {
    if request.query.trim().is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".to_string()));
    }

    let updates = state.recommendations.get_recommendations(&request.query).await?;

    let events = updates
        .map(|update| {
            let event = match update {
                RecommendationUpdate::Display(text) => Event::default().event("display").data(text),
                RecommendationUpdate::Complete {
                    answer,
                    recommendations,
                } => {
                    let payload = CompletePayload {
                        answer,
                        recommendations,
                    };
                    match Event::default().event("complete").json_data(&payload) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize terminal event");
                            Event::default().event("complete").data("{}")
                        }
                    }
                }
            };
            Ok(event)
        })
        .boxed();

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc123"));
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
