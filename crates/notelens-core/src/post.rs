//! The exposed operation: analyze the images of one social-media post.

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::images::ImageLoader;
use crate::vision::{AnalysisOutcome, GeminiClient, VisionAnalyzer};

/// Input of one invocation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    /// Full text of the post.
    #[serde(rename = "red_note")]
    pub note: String,
    /// Image URLs or local paths, in post order.
    pub urls: Vec<String>,
    /// Per-call API key, overriding everything else.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Load the post's images and ask the model about them.
///
/// Nothing is cached between calls: the key is resolved and the client is
/// built fresh each time. When no image loads, the model is never called.
pub async fn analyze_post(config: &Config, post: &PostInput) -> AnalysisOutcome {
    let api_key = config.resolve_api_key(post.api_key.as_deref());
    if !config::is_usable_key(&api_key) {
        warn!(env = config::API_KEY_ENV, "No API key configured, analysis will fail");
    }
    let model = GeminiClient::from_config(&api_key, config);

    info!(urls = post.urls.len(), model = %model.model(), "Analyzing post images");
    let images = ImageLoader::new(config.fetch_timeout)
        .load_all(&post.urls)
        .await;
    if images.is_empty() {
        warn!("No image could be loaded");
        return AnalysisOutcome::NoImages;
    }

    VisionAnalyzer::new(&model)
        .with_prompt(config.prompt.as_str())
        .with_timeout(config.request_timeout)
        .analyze(images, Some(post.note.as_str()), &post.urls)
        .await
}
