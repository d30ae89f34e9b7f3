//! Sequential image loading with per-item failure isolation.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::model::{DecodedImage, ImageRef};
use crate::error::{NotelensError, NotelensResult};

/// Fetches and decodes images from URLs or local paths.
#[derive(Clone)]
pub struct ImageLoader {
    client: reqwest::Client,
}

impl ImageLoader {
    /// Create a loader whose downloads give up after `fetch_timeout`.
    pub fn new(fetch_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Load and decode a single reference.
    pub async fn load(&self, reference: &str) -> NotelensResult<DecodedImage> {
        let bytes = match ImageRef::parse(reference) {
            ImageRef::Remote(url) => self.fetch(&url).await?,
            ImageRef::Local(path) => tokio::fs::read(&path).await?,
        };

        // Decoding and re-encoding are CPU bound
        let source = reference.to_string();
        let image =
            tokio::task::spawn_blocking(move || DecodedImage::decode(&source, bytes)).await??;
        info!(
            source = reference,
            width = image.width,
            height = image.height,
            "Loaded image"
        );
        Ok(image)
    }

    /// Load every reference in order, skipping the ones that fail.
    ///
    /// Failures are logged and dropped; the result keeps the relative order
    /// of the successes and is empty when nothing could be loaded.
    pub async fn load_all(&self, references: &[String]) -> Vec<DecodedImage> {
        let mut images = Vec::with_capacity(references.len());

        for reference in references {
            match self.load(reference).await {
                Ok(image) => images.push(image),
                Err(e) => warn!(source = %reference, error = %e, "Skipping image"),
            }
        }

        debug!(requested = references.len(), loaded = images.len(), "Image batch done");
        images
    }

    async fn fetch(&self, url: &str) -> NotelensResult<Vec<u8>> {
        debug!(url, "Downloading image");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotelensError::FetchStatus {
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FETCH_TIMEOUT)
    }
}
