//! Text-generation collaborator: the narrow contract the pipeline talks to.
//!
//! Every LLM-assisted decision (short selection, sentence splitting,
//! translation, metadata) goes through [`TextGenerator`]. Backends are plain
//! objects handed to each stage, so tests can pass canned implementations.

pub mod gemini;
pub mod openai;
pub mod prompts;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use crate::config::{Config, Provider};
use crate::error::{Result, ShortsmithError};
use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

/// A rendered request for the collaborator.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// System instruction guiding the model's behavior.
    pub system: String,
    /// Task-specific payload.
    pub task: String,
    pub temperature: f32,
    /// Ask the backend for a JSON object instead of free text.
    pub structured: bool,
}

impl Prompt {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ShortsmithError::Llm(
                "Temperature must be between 0 and 1".to_string(),
            ));
        }
        if self.system.trim().is_empty() || self.task.trim().is_empty() {
            return Err(ShortsmithError::Llm("Prompts cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send the prompt and return the raw reply text.
    async fn generate(&self, prompt: &Prompt) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Request a structured reply and parse it into `T`.
///
/// Transport failures are returned as errors. A reply that does not parse is
/// a contract violation and comes back as `Ok(None)`.
pub async fn generate_structured<T: DeserializeOwned>(
    generator: &dyn TextGenerator,
    prompt: &Prompt,
) -> Result<Option<T>> {
    let reply = generator.generate(prompt).await?;
    let parsed = parse_structured(&reply);
    if parsed.is_none() {
        warn!(
            "{} returned malformed structured output: {}",
            generator.name(),
            reply.chars().take(200).collect::<String>()
        );
    }
    Ok(parsed)
}

/// Extract a JSON object from a model reply, tolerating code fences and
/// surrounding prose.
pub fn parse_structured<T: DeserializeOwned>(reply: &str) -> Option<T> {
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    let fence_re = FENCE_RE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("Invalid regex"));

    let body = fence_re
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply)
        .trim();

    if let Ok(value) = serde_json::from_str(body) {
        return Some(value);
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&body[start..=end]).ok()
}

/// Retry behavior for HTTP backends.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Send a request built by `build`, retrying server errors, rate limiting and
/// transport failures with exponential backoff. Returns the response body.
pub(crate) async fn send_with_retry<F>(
    backend: &str,
    policy: RetryPolicy,
    build: F,
) -> Result<String>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error = None;

    for attempt in 0..policy.max_retries.max(1) {
        if attempt > 0 {
            let delay = policy.base_delay * 2u32.pow(attempt - 1);
            debug!("{} retry attempt {} after {:?}", backend, attempt, delay);
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(resp) => {
                let status = resp.status();
                debug!("{} API response status: {}", backend, status);

                if status.is_success() {
                    return Ok(resp.text().await?);
                }

                let error_body = resp.text().await.unwrap_or_default();

                // Don't retry on client errors, except rate limiting
                if status.is_client_error() && status.as_u16() != 429 {
                    return Err(ShortsmithError::Llm(format!(
                        "{} API error ({}): {}",
                        backend, status, error_body
                    )));
                }

                warn!("{} API error ({}): {}", backend, status, error_body);
                last_error = Some(ShortsmithError::Llm(format!(
                    "{} API error: {}",
                    backend, status
                )));
            }
            Err(e) => {
                warn!("{} API request failed: {}", backend, e);
                last_error = Some(e.into());
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ShortsmithError::Llm("Unknown error".to_string())))
}

/// Build the collaborator for `provider` from configuration.
pub fn create_generator(config: &Config, provider: Provider) -> Result<Arc<dyn TextGenerator>> {
    match provider {
        Provider::Gemini => {
            let api_key = config.gemini_api_key.as_ref().ok_or_else(|| {
                ShortsmithError::Config(
                    "Gemini API key not set. Set GEMINI_API_KEY environment variable.".to_string(),
                )
            })?;
            let mut client = GeminiClient::new(api_key.clone());
            if let Some(model) = &config.model {
                client = client.with_model(model.clone());
            }
            Ok(Arc::new(client))
        }
        Provider::OpenAi => {
            let api_key = config.openai_api_key.as_ref().ok_or_else(|| {
                ShortsmithError::Config(
                    "OpenAI API key not set. Set OPENAI_API_KEY environment variable.".to_string(),
                )
            })?;
            let mut client = OpenAiClient::new(api_key.clone());
            if let Some(model) = &config.model {
                client = client.with_model(model.clone());
            }
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Range {
        start_index: i64,
        end_index: i64,
    }

    #[test]
    fn test_parse_plain_json() {
        let parsed: Option<Range> = parse_structured(r#"{"start_index": 2, "end_index": 5}"#);
        assert_eq!(
            parsed,
            Some(Range {
                start_index: 2,
                end_index: 5
            })
        );
    }

    #[test]
    fn test_parse_fenced_json() {
        let reply = "Here you go:\n```json\n{\"start_index\": 0, \"end_index\": 3}\n```";
        let parsed: Option<Range> = parse_structured(reply);
        assert_eq!(parsed.map(|r| r.end_index), Some(3));
    }

    #[test]
    fn test_parse_json_with_prose() {
        let reply = "Selection: {\"start_index\": 1, \"end_index\": 4} hope this helps";
        let parsed: Option<Range> = parse_structured(reply);
        assert_eq!(parsed.map(|r| r.start_index), Some(1));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_structured::<Range>("I picked lines 2 to 5").is_none());
        assert!(parse_structured::<Range>(r#"{"start_index": 2}"#).is_none());
    }

    #[test]
    fn test_prompt_validation() {
        let mut prompt = Prompt {
            system: "You edit videos.".to_string(),
            task: "Pick lines.".to_string(),
            temperature: 0.7,
            structured: false,
        };
        assert!(prompt.validate().is_ok());

        prompt.temperature = 1.5;
        assert!(prompt.validate().is_err());

        prompt.temperature = 0.0;
        prompt.task = "  ".to_string();
        assert!(prompt.validate().is_err());
    }

    #[test]
    fn test_create_generator_requires_key() {
        let config = Config::default();
        assert!(create_generator(&config, Provider::Gemini).is_err());

        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let generator = create_generator(&config, Provider::OpenAi).unwrap();
        assert_eq!(generator.name(), "openai");
    }
}
