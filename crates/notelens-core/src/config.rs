//! Process-wide configuration and credential resolution.
//!
//! A [`Config`] is built once at startup (usually from CLI flags) and shared
//! read-only between invocations. The API key is the one value that is
//! resolved again on every call, see [`Config::resolve_api_key`].

use std::time::Duration;

use serde::Serialize;

use crate::vision::prompt::DEFAULT_PROMPT;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Placeholder used when no key is configured anywhere. Never a valid key.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro-preview-03-25";

/// Default Gemini REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default budget for the remote model call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Default budget for a single image download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.7,
            top_k: 32,
            max_output_tokens: 2048,
        }
    }
}

/// One harm category threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    pub fn new(category: &str, threshold: &str) -> Self {
        Self {
            category: category.to_string(),
            threshold: threshold.to_string(),
        }
    }
}

/// Model configuration applied to every call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub generation: GenerationConfig,
    pub safety: Vec<SafetySetting>,
    pub system_instruction: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let threshold = "BLOCK_MEDIUM_AND_ABOVE";
        Self {
            generation: GenerationConfig::default(),
            safety: vec![
                SafetySetting::new("HARM_CATEGORY_HARASSMENT", threshold),
                SafetySetting::new("HARM_CATEGORY_HATE_SPEECH", threshold),
                SafetySetting::new("HARM_CATEGORY_SEXUALLY_EXPLICIT", threshold),
                SafetySetting::new("HARM_CATEGORY_DANGEROUS_CONTENT", threshold),
            ],
            system_instruction: None,
        }
    }
}

/// Runtime configuration for the analyzer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key supplied at startup (`--api-key`). Takes precedence over the environment.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub prompt: String,
    pub settings: ModelSettings,
    pub request_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            settings: ModelSettings::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl Config {
    /// Resolve the API key for one invocation.
    ///
    /// Order: the tool argument, the startup key, `GOOGLE_API_KEY` (read now,
    /// not at startup), then [`API_KEY_PLACEHOLDER`].
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> String {
        let from_env = std::env::var(API_KEY_ENV).ok();
        resolve_api_key_from(explicit, self.api_key.as_deref(), from_env.as_deref())
    }

    /// True when a real key is available without a tool argument.
    pub fn has_api_key(&self) -> bool {
        is_usable_key(&self.resolve_api_key(None))
    }
}

/// Pick the first non-blank candidate, falling back to the placeholder.
pub fn resolve_api_key_from(
    explicit: Option<&str>,
    configured: Option<&str>,
    from_env: Option<&str>,
) -> String {
    [explicit, configured, from_env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .unwrap_or(API_KEY_PLACEHOLDER)
        .to_string()
}

/// A key is usable when it is non-blank and not the placeholder.
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != API_KEY_PLACEHOLDER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_placeholder() {
        assert_eq!(resolve_api_key_from(None, None, None), API_KEY_PLACEHOLDER);
    }

    #[test]
    fn test_resolve_priority() {
        assert_eq!(
            resolve_api_key_from(Some("tool"), Some("startup"), Some("env")),
            "tool"
        );
        assert_eq!(resolve_api_key_from(None, Some("startup"), Some("env")), "startup");
        assert_eq!(resolve_api_key_from(None, None, Some("env")), "env");
    }

    #[test]
    fn test_resolve_skips_blank_values() {
        assert_eq!(resolve_api_key_from(Some("  "), None, Some("env")), "env");
        assert_eq!(resolve_api_key_from(Some(""), Some(""), Some("")), API_KEY_PLACEHOLDER);
    }

    #[test]
    fn test_resolve_reads_environment_per_call() {
        // Only this test touches the variable
        std::env::remove_var(API_KEY_ENV);
        let config = Config::default();
        assert_eq!(config.resolve_api_key(None), API_KEY_PLACEHOLDER);
        assert!(!config.has_api_key());

        std::env::set_var(API_KEY_ENV, "env-key");
        assert_eq!(config.resolve_api_key(None), "env-key");
        assert_eq!(config.resolve_api_key(Some("tool-key")), "tool-key");

        std::env::remove_var(API_KEY_ENV);
        assert_eq!(config.resolve_api_key(None), API_KEY_PLACEHOLDER);
    }

    #[test]
    fn test_placeholder_is_not_usable() {
        assert!(!is_usable_key(API_KEY_PLACEHOLDER));
        assert!(!is_usable_key(" "));
        assert!(is_usable_key("AIza-test"));
    }

    #[test]
    fn test_default_settings_cover_four_categories() {
        let settings = ModelSettings::default();
        assert_eq!(settings.safety.len(), 4);
        assert!(settings
            .safety
            .iter()
            .all(|s| s.threshold == "BLOCK_MEDIUM_AND_ABOVE"));
        assert_eq!(settings.generation.top_k, 32);
        assert_eq!(settings.generation.max_output_tokens, 2048);
        assert!(settings.system_instruction.is_none());
    }
}
