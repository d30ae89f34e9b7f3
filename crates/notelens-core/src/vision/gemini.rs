//! Gemini `generateContent` client.
//!
//! Serializes an [`AnalysisRequest`] into a single user turn with inline
//! base64 images, always attaching the configured generation and safety
//! settings, and returns the text of the first candidate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::analyzer::VisionModel;
use super::request::{AnalysisRequest, RequestPart};
use crate::config::{self, Config, GenerationConfig, ModelSettings, SafetySetting};
use crate::error::{NotelensError, NotelensResult};

/// Client for the Gemini REST API.
pub struct GeminiClient {
    api_key: String,
    model: String,
    api_base: String,
    settings: ModelSettings,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    generation_config: &'a GenerationConfig,
    safety_settings: &'a [SafetySetting],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    /// Create a client with default endpoint and settings.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            api_base: config::DEFAULT_API_BASE.to_string(),
            settings: ModelSettings::default(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client for `api_key` using the model, endpoint and settings in `config`.
    pub fn from_config(api_key: &str, config: &Config) -> Self {
        Self::new(api_key, &config.model)
            .with_api_base(&config.api_base)
            .with_settings(config.settings.clone())
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    fn build_body(&self, request: &AnalysisRequest) -> GenerateContentRequest<'_> {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                RequestPart::Text(text) => Part::Text { text: text.clone() },
                RequestPart::Image(image) => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.to_string(),
                        data: image.to_base64(),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: &self.settings.generation,
            safety_settings: &self.settings.safety,
            system_instruction: self.settings.system_instruction.as_ref().map(|text| Content {
                role: None,
                parts: vec![Part::Text { text: text.clone() }],
            }),
        }
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, request: &AnalysisRequest) -> NotelensResult<String> {
        if !config::is_usable_key(&self.api_key) {
            warn!("Refusing to call Gemini without an API key");
            return Err(NotelensError::MissingCredential);
        }

        let body = self.build_body(request);

        debug!(
            model = %self.model,
            parts = request.parts.len(),
            images = request.image_count(),
            "Calling Gemini generateContent"
        );
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(NotelensError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)?;
        extract_text(parsed)
    }
}

/// Pull the provider's message out of an error body, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Concatenate the visible text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> NotelensResult<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(NotelensError::Blocked(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        return Err(NotelensError::EmptyResponse(
            candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string()),
        ));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::DecodedImage;
    use image::ImageFormat;

    fn sample_request() -> AnalysisRequest {
        let image = DecodedImage {
            source: "a.png".to_string(),
            width: 1,
            height: 1,
            format: ImageFormat::Png,
            mime_type: "image/png",
            data: vec![0xAB, 0xCD],
        };
        AnalysisRequest::build("PROMPT", Some("note"), &["u1".to_string()], vec![image])
    }

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_body_shape() {
        let client = GeminiClient::new("key", "gemini-test");
        let body = serde_json::to_value(client.build_body(&sample_request())).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "PROMPT");
        assert_eq!(parts[1]["text"], "note");
        assert_eq!(parts[2]["text"], "u1");
        assert_eq!(parts[3]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[3]["inlineData"]["data"], "q80=");

        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert_eq!(body["generationConfig"]["topK"], 32);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_body_includes_system_instruction() {
        let settings = ModelSettings {
            system_instruction: Some("be brief".to_string()),
            ..ModelSettings::default()
        };
        let client = GeminiClient::new("key", "m").with_settings(settings);
        let body = serde_json::to_value(client.build_body(&sample_request())).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(body["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = GeminiClient::new("k", "gemini-x").with_api_base("http://localhost:9/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-x:generateContent"
        );
    }

    #[test]
    fn test_extract_text_joins_parts_and_skips_thoughts() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"thinking...","thought":true},
                {"text":"Location: "},
                {"text":"Louvre"}
            ]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(extract_text(response).unwrap(), "Location: Louvre");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        let err = extract_text(response).unwrap_err();
        assert!(matches!(err, NotelensError::Blocked(ref r) if r == "SAFETY"));
    }

    #[test]
    fn test_extract_text_empty_candidate() {
        let response = parse(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#);
        let err = extract_text(response).unwrap_err();
        assert_eq!(err.to_string(), "Model returned no text (finish reason: MAX_TOKENS)");
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "API key not valid.");
        assert_eq!(api_error_message(" gateway down \n"), "gateway down");
    }

    #[tokio::test]
    async fn test_placeholder_key_fails_before_sending() {
        // unroutable base: a request attempt would surface as Http, not MissingCredential
        let client = GeminiClient::new(config::API_KEY_PLACEHOLDER, "m")
            .with_api_base("http://127.0.0.1:1");
        let err = client.generate(&sample_request()).await.unwrap_err();
        assert!(matches!(err, NotelensError::MissingCredential));
    }
}
