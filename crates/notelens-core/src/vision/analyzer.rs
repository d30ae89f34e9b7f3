//! Vision analysis over an abstract model handle.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::prompt::DEFAULT_PROMPT;
use super::request::AnalysisRequest;
use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::error::{NotelensError, NotelensResult};
use crate::images::DecodedImage;

/// Prefix placed in front of every analysis text returned to the tool caller.
pub const RESULT_PREFIX: &str = "Image analysis result: ";

/// Marker placed in front of remote failure descriptions.
pub const ERROR_MARKER: &str = "Error during analysis: ";

/// Tool text when no image could be loaded.
pub const EMPTY_IMAGES_MESSAGE: &str = "Image data processing failed: image data is empty";

/// A multimodal model that turns a request into text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, request: &AnalysisRequest) -> NotelensResult<String>;
}

/// Result of one analysis.
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// The model answered.
    Success(String),
    /// Nothing to analyze; the model was not called.
    NoImages,
    /// The model call failed.
    Failure(NotelensError),
}

impl AnalysisOutcome {
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Success(_))
    }

    /// Model text on success.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success(text) => Some(text),
            _ => None,
        }
    }

    /// Human-readable text handed back to the tool caller.
    pub fn render(&self) -> String {
        match self {
            Self::Success(text) => format!("{RESULT_PREFIX}{text}\n"),
            Self::NoImages => EMPTY_IMAGES_MESSAGE.to_string(),
            Self::Failure(e) => format!("{RESULT_PREFIX}{ERROR_MARKER}{e}\n"),
        }
    }
}

impl fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Builds requests and runs them against a [`VisionModel`] under a timeout.
pub struct VisionAnalyzer<'a> {
    model: &'a dyn VisionModel,
    prompt: String,
    timeout: Duration,
}

impl<'a> VisionAnalyzer<'a> {
    pub fn new(model: &'a dyn VisionModel) -> Self {
        Self {
            model,
            prompt: DEFAULT_PROMPT.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the instruction prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Analyze `images` together with the post text and source URLs.
    ///
    /// Never fails: errors come back as [`AnalysisOutcome::Failure`].
    pub async fn analyze(
        &self,
        images: Vec<DecodedImage>,
        context: Option<&str>,
        urls: &[String],
    ) -> AnalysisOutcome {
        if images.is_empty() {
            return AnalysisOutcome::NoImages;
        }

        let request = AnalysisRequest::build(&self.prompt, context, urls, images);
        let image_count = request.image_count();

        match tokio::time::timeout(self.timeout, self.model.generate(&request)).await {
            Ok(Ok(text)) => {
                info!(images = image_count, chars = text.len(), "Analysis complete");
                AnalysisOutcome::Success(text)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Analysis failed");
                AnalysisOutcome::Failure(e)
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Analysis timed out");
                AnalysisOutcome::Failure(NotelensError::Timeout(self.timeout))
            }
        }
    }
}
