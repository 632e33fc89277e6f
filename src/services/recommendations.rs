/// Recommendation flow: prompt the model with the cached catalog, stream
/// its output back as display updates, and resolve the referenced ids
/// against the cache.
use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::json;

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::{Recommendation, Video},
    services::gemini::GenerativeModel,
    services::stream_parser::StreamingResponseParser,
};

/// Fixed reply when the catalog has nothing to recommend from
pub const NO_CONTENT_MESSAGE: &str =
    "Your library is empty. Sync your playlists first, then ask me again.";

/// Descriptions are capped before they go into the prompt
const MAX_DESCRIPTION_CHARS: usize = 200;

/// One event in the recommendation stream
///
/// `Display` updates arrive in fragment order while the model streams;
/// exactly one `Complete` terminates the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationUpdate {
    Display(String),
    Complete {
        answer: String,
        recommendations: Vec<Recommendation>,
    },
}

#[derive(Clone)]
pub struct RecommendationService {
    store: CatalogStore,
    model: Arc<dyn GenerativeModel>,
}

impl RecommendationService {
    pub fn new(store: CatalogStore, model: Arc<dyn GenerativeModel>) -> Self {
        Self { store, model }
    }

    /// Streams a recommendation answer for the query
    ///
    /// An empty catalog short-circuits with a fixed message before any
    /// model call. Errors surface only from the catalog read and the
    /// stream open; everything after that degrades into the terminal
    /// `Complete` event.
    pub async fn get_recommendations(
        &self,
        query: &str,
    ) -> AppResult<BoxStream<'static, RecommendationUpdate>> {
        let videos = self.store.get_all_videos().await?;

        if videos.is_empty() {
            tracing::info!("Recommendation request against empty catalog");
            let complete = RecommendationUpdate::Complete {
                answer: NO_CONTENT_MESSAGE.to_string(),
                recommendations: Vec::new(),
            };
            return Ok(futures::stream::once(async move { complete }).boxed());
        }

        let prompt = build_prompt(&videos, query);
        tracing::debug!(
            catalog_size = videos.len(),
            prompt_chars = prompt.len(),
            "Opening recommendation stream"
        );

        let mut fragments = self.model.stream_generate(&prompt).await?;

        let stream = async_stream::stream! {
            let mut parser = StreamingResponseParser::new();

            while let Some(item) = fragments.next().await {
                match item {
                    Ok(fragment) => {
                        yield RecommendationUpdate::Display(
                            parser.push(&fragment.text, fragment.thought),
                        );
                    }
                    Err(e) => {
                        // Salvage whatever arrived before the transport
                        // gave out; extraction still runs below.
                        tracing::warn!(error = %e, "Model stream interrupted");
                        break;
                    }
                }
            }

            let (answer, suggestions) = parser.finish();
            let recommendations = hydrate(&videos, suggestions);

            tracing::info!(
                recommendations = recommendations.len(),
                "Recommendation stream complete"
            );

            yield RecommendationUpdate::Complete {
                answer,
                recommendations,
            };
        };

        Ok(stream.boxed())
    }
}

/// Resolves suggested ids against the cached catalog
///
/// References to ids the model was never given are dropped silently.
fn hydrate(
    videos: &[Video],
    suggestions: Vec<crate::models::VideoSuggestion>,
) -> Vec<Recommendation> {
    let by_id: HashMap<&str, &Video> = videos.iter().map(|v| (v.id.as_str(), v)).collect();

    suggestions
        .into_iter()
        .filter_map(|s| {
            let Some(video) = by_id.get(s.item_id.as_str()) else {
                tracing::warn!(item_id = %s.item_id, "Dropping suggestion for unknown video");
                return None;
            };
            Some(Recommendation {
                video: (*video).clone(),
                reason: s.reason,
            })
        })
        .collect()
}

/// Builds the model prompt: catalog serialization, user query, and the
/// output contract
fn build_prompt(videos: &[Video], query: &str) -> String {
    let catalog: Vec<serde_json::Value> = videos
        .iter()
        .map(|v| {
            json!({
                "id": v.id,
                "title": v.title,
                "description": truncate_chars(&v.description, MAX_DESCRIPTION_CHARS),
                "channel": v.channel_title,
                "duration": v.duration.as_deref().unwrap_or("Unknown"),
            })
        })
        .collect();

    format!(
        "You are a recommendation assistant for a personal video library.\n\
         Here is the full library as JSON:\n{catalog}\n\n\
         The user asks: {query}\n\n\
         Think through the options out loud first, then answer.\n\
         Only recommend videos from the library above, referenced by their id.\n\
         Finish with exactly one fenced block of the form:\n\
         ```json\n\
         {{\"answer\": \"<your message to the user>\", \
         \"suggestedItems\": [{{\"itemId\": \"<id>\", \"reason\": \"<why>\"}}]}}\n\
         ```",
        catalog = serde_json::to_string(&catalog).unwrap_or_else(|_| "[]".to_string()),
        query = query,
    )
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
