//! Per-provider configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::auth::ApiKey;
use crate::{Error, ModelCapability, Result};

/// Default request timeout for a provider.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry budget for a provider.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration bound to exactly one provider instance.
///
/// The name is the registry key and cannot be empty; it is checked once in
/// [`ProviderConfig::new`] and never changes afterwards.
///
/// # Examples
///
/// ```
/// use switchboard_providers::{ModelCapability, ProviderConfig};
///
/// let config = ProviderConfig::new("local")
///     .unwrap()
///     .with_endpoint("http://localhost:11434")
///     .with_capabilities([ModelCapability::Chat, ModelCapability::TextGeneration]);
///
/// assert_eq!(config.name(), "local");
/// assert!(config.supports(ModelCapability::Chat));
/// assert!(ProviderConfig::new("").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    name: String,
    api_key: Option<ApiKey>,
    endpoint: Option<String>,
    default_model: Option<String>,
    timeout: Duration,
    max_retries: u32,
    headers: BTreeMap<String, String>,
    capabilities: Vec<ModelCapability>,
}

impl ProviderConfig {
    /// Create a config with defaults for everything but the name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `name` is empty or whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Configuration(
                "provider name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            api_key: None,
            endpoint: None,
            default_model: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            headers: BTreeMap::new(),
            capabilities: Vec::new(),
        })
    }

    /// Set the credential.
    pub fn with_api_key(mut self, key: impl Into<ApiKey>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL of the backend.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the model used when a call does not name one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Add one custom header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Declare the capability set. Order is kept, duplicates are dropped.
    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = ModelCapability>) -> Self {
        self.capabilities.clear();
        for cap in caps {
            if !self.capabilities.contains(&cap) {
                self.capabilities.push(cap);
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Declared capabilities, in declaration order.
    pub fn capabilities(&self) -> &[ModelCapability] {
        &self.capabilities
    }

    /// Whether `capability` was declared.
    pub fn supports(&self, capability: ModelCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let config = ProviderConfig::new("openai").unwrap();
        assert_eq!(config.name(), "openai");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
        assert!(config.api_key().is_none());
        assert!(config.endpoint().is_none());
        assert!(config.default_model().is_none());
        assert!(config.headers().is_empty());
        assert!(config.capabilities().is_empty());
    }

    #[test]
    fn new_rejects_blank_names() {
        assert!(matches!(
            ProviderConfig::new(""),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            ProviderConfig::new("   "),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn builder_sets_all_fields() {
        let config = ProviderConfig::new("openrouter")
            .unwrap()
            .with_api_key("sk-or")
            .with_endpoint("https://openrouter.ai/api/v1")
            .with_default_model("mistral-7b:free")
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(1)
            .with_header("HTTP-Referer", "https://example.com");

        assert_eq!(config.api_key().unwrap().expose_secret(), "sk-or");
        assert_eq!(config.endpoint(), Some("https://openrouter.ai/api/v1"));
        assert_eq!(config.default_model(), Some("mistral-7b:free"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries(), 1);
        assert_eq!(
            config.headers().get("HTTP-Referer").map(String::as_str),
            Some("https://example.com")
        );
    }

    #[test]
    fn capabilities_keep_order_and_drop_duplicates() {
        let config = ProviderConfig::new("p").unwrap().with_capabilities([
            ModelCapability::Chat,
            ModelCapability::Embedding,
            ModelCapability::Chat,
        ]);
        assert_eq!(
            config.capabilities(),
            &[ModelCapability::Chat, ModelCapability::Embedding]
        );
        assert!(config.supports(ModelCapability::Embedding));
        assert!(!config.supports(ModelCapability::Moderation));
    }

    #[test]
    fn debug_does_not_leak_credential() {
        let config = ProviderConfig::new("p").unwrap().with_api_key("sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
