use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Catalog reads
        .route("/videos", get(handlers::get_videos))
        .route("/playlists", get(handlers::get_playlists))
        // Local watched flag
        .route("/videos/:id/watched", post(handlers::set_watched))
        // Sync triggers
        .route("/sync", post(handlers::sync_all))
        .route("/sync/playlists/:id", post(handlers::sync_playlist))
        // Streaming recommendations
        .route("/recommendations", post(handlers::recommendations))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
