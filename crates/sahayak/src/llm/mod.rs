//! External LLM client used only for formatting: turning retrieved policy
//! context into prose, and powering the tax advisor's conversational
//! wrapper. The routing core never depends on it.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::LlmConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiProvider {
    OpenAI,
    Google,
    Ollama,
    Custom { endpoint: String },
}

impl ApiProvider {
    /// Map a config string to a provider. Unknown values are treated as a
    /// custom OpenAI-compatible endpoint URL.
    pub fn from_config(provider: &str) -> Self {
        match provider {
            "openai" => Self::OpenAI,
            "google" | "gemini" => Self::Google,
            "ollama" => Self::Ollama,
            other => Self::Custom {
                endpoint: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 80,
            temperature: 0.0,
        }
    }
}

impl From<&LlmConfig> for GenerationConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Text generation seam. Production uses [`LlmClient`]; tests stub it.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

pub struct LlmClient {
    provider: ApiProvider,
    api_key: String,
    model: String,
    client: Client,
}

impl LlmClient {
    pub fn new(provider: ApiProvider, api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .timeout(std::time::Duration::from_secs(120))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            provider,
            api_key,
            model,
            client,
        })
    }

    /// Build a client from config, reading the API key from the configured
    /// environment variable (empty for keyless local endpoints).
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = ApiProvider::from_config(&config.provider);
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        if api_key.is_empty() && !matches!(provider, ApiProvider::Ollama | ApiProvider::Custom { .. }) {
            return Err(anyhow!(
                "API key environment variable {} is not set",
                config.api_key_env
            ));
        }
        Self::new(provider, api_key, config.model.clone())
    }

    fn endpoint(&self) -> String {
        match &self.provider {
            ApiProvider::OpenAI => "https://api.openai.com/v1/chat/completions".to_string(),
            ApiProvider::Google => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                self.model
            ),
            ApiProvider::Ollama => "http://localhost:11434/v1/chat/completions".to_string(),
            ApiProvider::Custom { endpoint } => endpoint.clone(),
        }
    }

    /// Parse a response body as JSON, returning a clear error if the server
    /// returned HTML (a proxy page, a downed service).
    async fn parse_json_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response body from {}: {}", endpoint, e))?;
        let trimmed = body.trim_start();
        if trimmed.starts_with('<') || trimmed.starts_with("<!") {
            let preview: String = trimmed.chars().take(200).collect();
            return Err(anyhow!(
                "Endpoint {} returned HTML instead of JSON (HTTP {}) — service may be down. Response: {}",
                endpoint,
                status,
                preview
            ));
        }
        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            anyhow!(
                "Failed to parse JSON from {} (HTTP {}): {}. Body: {}",
                endpoint,
                status,
                e,
                preview
            )
        })
    }

    async fn openai_compatible_generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        let endpoint = self.endpoint();
        let request = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "stream": false
        });

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("Request to {} timed out — check network connectivity", endpoint)
                } else if e.is_connect() {
                    anyhow!("Failed to connect to {}: {}", endpoint, e)
                } else {
                    anyhow!("Request to {} failed: {}", endpoint, e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await?;
            return Err(anyhow!("API error ({}): {}", status, error));
        }

        let result: OpenAIResponse = Self::parse_json_response(response, &endpoint).await?;
        result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow!("API returned empty choices array"))
    }

    async fn google_generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let endpoint = self.endpoint();
        let request = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "temperature": config.temperature,
                "maxOutputTokens": config.max_tokens,
            }
        });

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = response.text().await?;
            return Err(anyhow!("Google API error: {}", error));
        }

        let result: GoogleResponse = Self::parse_json_response(response, &endpoint).await?;
        if let Some(candidate) = result.candidates.first() {
            if let Some(part) = candidate.content.parts.first() {
                return Ok(part.text.clone());
            }
        }

        Err(anyhow!("No response from Google Gemini"))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let start = std::time::Instant::now();
        let result = match &self.provider {
            ApiProvider::OpenAI | ApiProvider::Ollama | ApiProvider::Custom { .. } => {
                self.openai_compatible_generate(prompt, config).await
            }
            ApiProvider::Google => self.google_generate(prompt, config).await,
        };
        tracing::debug!(
            provider = ?self.provider,
            latency_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "LLM generation call finished"
        );
        result
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: String,
}

#[derive(Deserialize)]
struct GoogleResponse {
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: GoogleContent,
}

#[derive(Deserialize)]
struct GoogleContent {
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parsing_falls_back_to_custom_endpoint() {
        assert_eq!(ApiProvider::from_config("openai"), ApiProvider::OpenAI);
        assert_eq!(ApiProvider::from_config("gemini"), ApiProvider::Google);
        assert_eq!(ApiProvider::from_config("ollama"), ApiProvider::Ollama);
        assert_eq!(
            ApiProvider::from_config("http://10.0.0.5:8080/v1/chat/completions"),
            ApiProvider::Custom {
                endpoint: "http://10.0.0.5:8080/v1/chat/completions".to_string()
            }
        );
    }

    #[test]
    fn google_endpoint_embeds_the_model_name() {
        let client = LlmClient::new(
            ApiProvider::Google,
            "key".to_string(),
            "gemini-2.5-flash".to_string(),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn openai_response_shape_parses() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"20 days of leave."}}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "20 days of leave.");
    }

    #[test]
    fn google_response_shape_parses() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Information not available."}]}}]}"#;
        let parsed: GoogleResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.candidates[0].content.parts[0].text,
            "Information not available."
        );
    }

    #[test]
    fn generation_config_defaults_are_deterministic_and_bounded() {
        let config = GenerationConfig::default();
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 80);
    }
}
