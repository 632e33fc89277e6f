use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use reelworthy::api::{create_router, AppState};
use reelworthy::config::Config;
use reelworthy::db::{create_pool, CatalogStore};
use reelworthy::services::gemini::GeminiClient;
use reelworthy::services::ingestion::IngestionPipeline;
use reelworthy::services::reconciler::CacheReconciler;
use reelworthy::services::recommendations::RecommendationService;
use reelworthy::services::sync::SyncService;
use reelworthy::services::youtube::{VideoSource, YouTubeClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let store = CatalogStore::new(pool);

    let source: Arc<dyn VideoSource> = Arc::new(YouTubeClient::new(
        config.youtube_api_key.clone(),
        config.youtube_api_url.clone(),
    ));
    let model = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
        config.gemini_model.clone(),
    ));

    let pipeline = IngestionPipeline::new(source.clone(), store.clone());
    let reconciler = CacheReconciler::new(store.clone());
    let sync = SyncService::new(source, pipeline, reconciler, store.clone());
    let recommendations = RecommendationService::new(store.clone(), model);

    let state = AppState::new(store, sync, recommendations);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
