use crate::db::CatalogStore;
use crate::services::recommendations::RecommendationService;
use crate::services::sync::SyncService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: CatalogStore,
    pub sync: SyncService,
    pub recommendations: RecommendationService,
}

impl AppState {
    pub fn new(
        store: CatalogStore,
        sync: SyncService,
        recommendations: RecommendationService,
    ) -> Self {
        Self {
            store,
            sync,
            recommendations,
        }
    }
}
