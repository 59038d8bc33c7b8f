//! Adapter for a self-hosted Ollama server.
//!
//! Prompts go to `/api/generate`, conversations to `/api/chat`, and the model
//! catalog and reachability probe both read `/api/tags`. Every local model is
//! reported as free tier.
//!
//! # Example
//!
//! ```ignore
//! use switchboard_providers::{OllamaProvider, ProviderConfig};
//!
//! // Uses localhost:11434 and llama2 unless the config says otherwise.
//! let provider = OllamaProvider::new(ProviderConfig::new("local")?)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::{AVAILABILITY_TIMEOUT, Message, Provider, ProviderConfig, QueryOptions};
use crate::{Error, ModelCapability, ModelInfo, Result};

/// Default Ollama API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Model used when the config names none.
pub const DEFAULT_MODEL: &str = "llama2";

/// Timeout for the `/api/tags` catalog call.
const LIST_MODELS_TIMEOUT: Duration = Duration::from_secs(5);

/// Capabilities assumed when the config declares none.
const DEFAULT_CAPABILITIES: [ModelCapability; 5] = [
    ModelCapability::TextGeneration,
    ModelCapability::Chat,
    ModelCapability::CodeGeneration,
    ModelCapability::Translation,
    ModelCapability::Summarization,
];

// ────────────────────────────────────────────────────────────────────────────
// Ollama API Types
// ────────────────────────────────────────────────────────────────────────────

/// Response from Ollama's `/api/tags` endpoint.
#[derive(Debug, Deserialize)]
pub struct OllamaTagsResponse {
    #[serde(default)]
    pub models: Vec<OllamaModel>,
}

/// Model information from Ollama's API.
#[derive(Debug, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

impl OllamaModel {
    /// Convert to a `ModelInfo` owned by `provider`.
    ///
    /// Capabilities and context length are guessed from the model name.
    pub fn to_model_info(&self, provider: &str) -> ModelInfo {
        let lower = self.name.to_lowercase();

        let mut capabilities = vec![ModelCapability::TextGeneration, ModelCapability::Chat];
        if lower.contains("code") {
            capabilities.push(ModelCapability::CodeGeneration);
        }

        let context_length = if lower.contains("mixtral") {
            32_768
        } else if lower.contains("mistral") {
            8_192
        } else {
            4_096
        };

        ModelInfo::builder(provider, &self.name)
            .capabilities(capabilities)
            .context_length(context_length)
            .cost_per_token(0.0)
            .free_tier()
            .description(format!(
                "Local Ollama model ({:.1}GB)",
                self.size as f64 / 1e9
            ))
            .build()
    }
}

/// Sampling options shared by `/api/generate` and `/api/chat`.
#[derive(Debug, Serialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

impl OllamaOptions {
    fn from_query(options: &QueryOptions) -> Option<Self> {
        if options.temperature.is_none() && options.max_tokens.is_none() {
            return None;
        }
        Some(Self {
            temperature: options.temperature,
            num_predict: options.max_tokens,
        })
    }
}

/// Request body for Ollama's `/api/generate` endpoint.
#[derive(Debug, Serialize)]
pub struct OllamaGenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

/// Response from Ollama's `/api/generate` endpoint.
#[derive(Debug, Deserialize)]
pub struct OllamaGenerateResponse {
    #[serde(default)]
    pub response: String,
}

/// Message in an Ollama chat request/response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body for Ollama's `/api/chat` endpoint.
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

/// Response from Ollama's `/api/chat` endpoint.
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    pub message: Option<OllamaChatMessage>,
}

/// Serialize `body` and merge `extra` keys that the typed body does not set.
fn with_extra<T: Serialize>(body: &T, extra: &Map<String, Value>) -> Result<Value> {
    let mut value = serde_json::to_value(body)?;
    if let Value::Object(map) = &mut value {
        for (key, v) in extra {
            map.entry(key.clone()).or_insert_with(|| v.clone());
        }
    }
    Ok(value)
}

// ────────────────────────────────────────────────────────────────────────────
// OllamaProvider
// ────────────────────────────────────────────────────────────────────────────

/// Ollama local model provider.
pub struct OllamaProvider {
    config: ProviderConfig,
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a provider from `config`, filling in Ollama defaults for the
    /// endpoint, default model, and capability set when absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if a custom header is not a valid HTTP
    /// header, or the HTTP client cannot be built.
    pub fn new(mut config: ProviderConfig) -> Result<Self> {
        if config.endpoint().is_none() {
            config = config.with_endpoint(DEFAULT_BASE_URL);
        }
        if config.default_model().is_none() {
            config = config.with_default_model(DEFAULT_MODEL);
        }
        if config.capabilities().is_empty() {
            config = config.with_capabilities(DEFAULT_CAPABILITIES);
        }

        let base_url = config
            .endpoint()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(Self::headers(&config)?)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        info!(provider = config.name(), base_url = %base_url, "initialized Ollama provider");

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    fn headers(config: &ProviderConfig) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in config.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Configuration(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Configuration(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }
        if let Some(key) = config.api_key() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                .map_err(|e| Error::Configuration(format!("invalid credential: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Get the base URL for this provider.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_for(&self, options: &QueryOptions) -> String {
        options
            .model
            .clone()
            .or_else(|| self.config.default_model().map(String::from))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// Built-in catalog used when the server cannot be listed.
    fn fallback_models(&self) -> Vec<ModelInfo> {
        let id = self.config.default_model().unwrap_or(DEFAULT_MODEL);
        vec![
            ModelInfo::builder(self.config.name(), id)
                .capabilities(self.config.capabilities().iter().copied())
                .context_length(4_096)
                .cost_per_token(0.0)
                .free_tier()
                .description("Default Ollama model")
                .build(),
        ]
    }

    async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!(
                "Ollama API returned {}: {}",
                status, body
            )));
        }
        Ok(response)
    }

    async fn fetch_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(LIST_MODELS_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ProviderApi(format!(
                "Ollama API returned status {}",
                response.status()
            )));
        }

        let tags: OllamaTagsResponse = response.json().await?;
        Ok(tags
            .models
            .iter()
            .map(|m| m.to_model_info(self.config.name()))
            .collect())
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn query(&self, prompt: &str, options: QueryOptions) -> Result<Option<String>> {
        let request = OllamaGenerateRequest {
            model: self.model_for(&options),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions::from_query(&options),
        };
        let body = with_extra(&request, &options.extra)?;

        let response: OllamaGenerateResponse = self.post("/api/generate", body).await?.json().await?;
        if response.response.is_empty() {
            error!(provider = self.name(), "no content in Ollama response");
            return Ok(None);
        }
        debug!(provider = self.name(), len = response.response.len(), "Ollama response");
        Ok(Some(response.response))
    }

    async fn send_chat(&self, messages: &[Message], options: QueryOptions) -> Result<Option<String>> {
        let request = OllamaChatRequest {
            model: self.model_for(&options),
            messages: messages
                .iter()
                .map(|m| OllamaChatMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            stream: false,
            options: OllamaOptions::from_query(&options),
        };
        let body = with_extra(&request, &options.extra)?;

        let response: OllamaChatResponse = self.post("/api/chat", body).await?.json().await?;
        match response.message.map(|m| m.content).filter(|c| !c.is_empty()) {
            Some(content) => {
                debug!(provider = self.name(), len = content.len(), "Ollama chat response");
                Ok(Some(content))
            }
            None => {
                error!(provider = self.name(), "no content in Ollama chat response");
                Ok(None)
            }
        }
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        match self.fetch_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => self.fallback_models(),
            Err(e) => {
                warn!(provider = self.name(), error = %e, "failed to list Ollama models");
                self.fallback_models()
            }
        }
    }

    async fn check_availability(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(AVAILABILITY_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(provider = self.name(), error = %e, "Ollama not reachable");
                false
            }
        }
    }
}
