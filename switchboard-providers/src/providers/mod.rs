//! Provider trait and implementations.
//!
//! The [`Provider`] trait is the single seam every backend sits behind,
//! whether a remote paid API or a local inference server. Only
//! [`query`](Provider::query) is ungated; everything else checks the
//! capability set declared in the provider's [`ProviderConfig`] first and
//! returns `Ok(None)` when it is missing.
//!
//! # Example
//!
//! ```ignore
//! use switchboard_providers::providers::{Provider, QueryOptions};
//!
//! async fn ask(provider: &dyn Provider) {
//!     let options = QueryOptions::new().temperature(0.2);
//!     if let Ok(Some(text)) = provider.query("Name three rivers.", options).await {
//!         println!("{text}");
//!     }
//! }
//! ```

mod config;
pub mod mock;
pub mod ollama;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

pub use config::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, ProviderConfig};
pub use mock::{MockProvider, MockReply};
pub use ollama::OllamaProvider;
pub use types::*;

use crate::{ModelCapability, ModelInfo, ModerationResult, Result};

/// Timeout for [`Provider::check_availability`] probes.
pub const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(2);

/// Trait for AI backends (cloud and local).
///
/// # Required Methods
///
/// - [`config`](Provider::config) - The config this instance is bound to
/// - [`query`](Provider::query) - Single-prompt completion
/// - [`list_models`](Provider::list_models) - Model catalog, never fails
/// - [`check_availability`](Provider::check_availability) - Cheap reachability probe
///
/// # Error Contract
///
/// `query` and `chat` may report a backend failure either as `Err` or by
/// logging it and returning `Ok(None)`. Callers treat both the same way.
/// `Ok(None)` (or empty text) with no error means "nothing usable".
#[async_trait]
pub trait Provider: Send + Sync {
    /// Returns the config this provider was built from.
    fn config(&self) -> &ProviderConfig;

    /// Returns the provider name (the registry key).
    fn name(&self) -> &str {
        self.config().name()
    }

    /// Model used when a call does not specify one.
    fn default_model(&self) -> Option<&str> {
        self.config().default_model()
    }

    /// Whether the provider declared `capability`.
    fn supports_capability(&self, capability: ModelCapability) -> bool {
        self.config().supports(capability)
    }

    /// Send a single prompt.
    async fn query(&self, prompt: &str, options: QueryOptions) -> Result<Option<String>>;

    /// List available models.
    ///
    /// Implementations must not fail: when the backend cannot be reached they
    /// return a small built-in list instead.
    async fn list_models(&self) -> Vec<ModelInfo>;

    /// Check whether the backend is reachable and configured.
    ///
    /// Must finish within a few seconds and return `false` on any error.
    async fn check_availability(&self) -> bool;

    /// Backend-specific chat call used by [`chat`](Provider::chat) once the
    /// capability check passed.
    ///
    /// Defaults to flattening the conversation into a single prompt.
    async fn send_chat(&self, messages: &[Message], options: QueryOptions) -> Result<Option<String>> {
        self.query(&messages_to_prompt(messages), options).await
    }

    /// Chat completion. Requires [`ModelCapability::Chat`].
    async fn chat(&self, messages: &[Message], options: QueryOptions) -> Result<Option<String>> {
        if !require(self, ModelCapability::Chat) {
            return Ok(None);
        }
        self.send_chat(messages, options).await
    }

    /// Text completion. Requires [`ModelCapability::TextGeneration`].
    ///
    /// Temperature defaults to 0.7 and max tokens to 500.
    async fn generate_text(&self, prompt: &str, options: QueryOptions) -> Result<Option<String>> {
        if !require(self, ModelCapability::TextGeneration) {
            return Ok(None);
        }
        self.query(prompt, options.with_defaults(0.7, Some(500))).await
    }

    /// Translate `text`. Requires [`ModelCapability::Translation`].
    ///
    /// The source language is auto-detected by the model when `None`.
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
        options: QueryOptions,
    ) -> Result<Option<String>> {
        if !require(self, ModelCapability::Translation) {
            return Ok(None);
        }
        let source = source_language
            .map(|lang| format!("from {lang} "))
            .unwrap_or_default();
        let prompt = format!("Translate the following {source}to {target_language}:\n\n{text}");
        self.query(&prompt, options.with_defaults(0.3, None)).await
    }

    /// Summarize `content` in at most `max_length` words.
    /// Requires [`ModelCapability::Summarization`].
    async fn summarize(
        &self,
        content: &str,
        max_length: u32,
        options: QueryOptions,
    ) -> Result<Option<String>> {
        if !require(self, ModelCapability::Summarization) {
            return Ok(None);
        }
        let prompt = format!(
            "Summarize the following content in {max_length} words or less:\n\n{content}"
        );
        let options = options.with_defaults(0.3, Some(max_length.saturating_mul(2)));
        self.query(&prompt, options).await
    }

    /// Rate `content` for safety. Requires [`ModelCapability::Moderation`].
    ///
    /// Missing capability, an empty answer, or an answer without a parseable
    /// verdict all yield [`ModerationResult::unknown`].
    async fn moderate_content(
        &self,
        content: &str,
        options: QueryOptions,
    ) -> Result<ModerationResult> {
        if !require(self, ModelCapability::Moderation) {
            return Ok(ModerationResult::unknown());
        }
        let prompt = format!(
            "Analyze the following content for safety and appropriateness. \
             Return a JSON response with fields: \
             safe (boolean), concerns (list), rating (G/PG/PG-13/R).\n\n{content}"
        );
        let response = self.query(&prompt, options.with_defaults(0.1, None)).await?;
        Ok(response
            .map(|text| ModerationResult::from_response(&text))
            .unwrap_or_else(ModerationResult::unknown))
    }
}

fn require<P: Provider + ?Sized>(provider: &P, capability: ModelCapability) -> bool {
    let supported = provider.supports_capability(capability);
    if !supported {
        warn!(
            provider = provider.name(),
            %capability,
            "provider does not support capability"
        );
    }
    supported
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentRating;

    fn provider(caps: &[ModelCapability]) -> MockProvider {
        MockProvider::new(
            ProviderConfig::new("mock")
                .unwrap()
                .with_capabilities(caps.iter().copied()),
        )
    }

    #[tokio::test]
    async fn query_is_ungated() {
        let p = provider(&[]).with_reply(MockReply::text("hi"));
        let out = p.query("anything", QueryOptions::new()).await.unwrap();
        assert_eq!(out.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn chat_without_capability_returns_none_without_calling_backend() {
        let p = provider(&[ModelCapability::TextGeneration]);
        let out = p.chat(&[Message::user("hi")], QueryOptions::new()).await.unwrap();
        assert!(out.is_none());
        assert_eq!(p.call_count(), 0);
    }

    #[tokio::test]
    async fn chat_flattens_messages_by_default() {
        let p = provider(&[ModelCapability::Chat]);
        p.chat(
            &[Message::system("be nice"), Message::user("hello")],
            QueryOptions::new(),
        )
        .await
        .unwrap();
        assert_eq!(p.prompts(), vec!["system: be nice\nuser: hello".to_string()]);
    }

    #[tokio::test]
    async fn generate_text_applies_sampling_defaults() {
        let p = provider(&[ModelCapability::TextGeneration]);
        p.generate_text("go", QueryOptions::new()).await.unwrap();
        let opts = p.last_options().unwrap();
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(500));
    }

    #[tokio::test]
    async fn translate_builds_prompt_with_optional_source() {
        let p = provider(&[ModelCapability::Translation]);
        p.translate("Hallo", "English", Some("German"), QueryOptions::new())
            .await
            .unwrap();
        p.translate("Bonjour", "English", None, QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(
            p.prompts(),
            vec![
                "Translate the following from German to English:\n\nHallo".to_string(),
                "Translate the following to English:\n\nBonjour".to_string(),
            ]
        );
        assert_eq!(p.last_options().unwrap().temperature, Some(0.3));
    }

    #[tokio::test]
    async fn summarize_scales_token_budget_with_length() {
        let p = provider(&[ModelCapability::Summarization]);
        p.summarize("long text", 50, QueryOptions::new()).await.unwrap();
        assert!(p.prompts()[0].starts_with("Summarize the following content in 50 words or less:"));
        assert_eq!(p.last_options().unwrap().max_tokens, Some(100));
    }

    #[tokio::test]
    async fn translate_and_summarize_are_gated() {
        let p = provider(&[ModelCapability::Chat]);
        assert!(p
            .translate("x", "French", None, QueryOptions::new())
            .await
            .unwrap()
            .is_none());
        assert!(p.summarize("x", 10, QueryOptions::new()).await.unwrap().is_none());
        assert!(p.generate_text("x", QueryOptions::new()).await.unwrap().is_none());
        assert_eq!(p.call_count(), 0);
    }

    #[tokio::test]
    async fn moderation_parses_verdict() {
        let p = provider(&[ModelCapability::Moderation]).with_reply(MockReply::text(
            r#"{"safe": true, "concerns": [], "rating": "G"}"#,
        ));
        let result = p.moderate_content("kittens", QueryOptions::new()).await.unwrap();
        assert!(result.safe);
        assert_eq!(result.rating, ContentRating::G);
    }

    #[tokio::test]
    async fn moderation_without_json_returns_default() {
        let p = provider(&[ModelCapability::Moderation])
            .with_reply(MockReply::text("I cannot answer that."));
        let result = p.moderate_content("x", QueryOptions::new()).await.unwrap();
        assert_eq!(result, ModerationResult::unknown());
    }

    #[tokio::test]
    async fn moderation_without_capability_returns_default() {
        let p = provider(&[ModelCapability::Chat]);
        let result = p.moderate_content("x", QueryOptions::new()).await.unwrap();
        assert_eq!(result, ModerationResult::unknown());
        assert_eq!(p.call_count(), 0);
    }

    #[tokio::test]
    async fn moderation_propagates_backend_errors() {
        let p = provider(&[ModelCapability::Moderation]).with_reply(MockReply::fail("down"));
        assert!(p.moderate_content("x", QueryOptions::new()).await.is_err());
    }

    #[test]
    fn accessors_delegate_to_config() {
        let p = MockProvider::new(
            ProviderConfig::new("named")
                .unwrap()
                .with_default_model("m1")
                .with_capabilities([ModelCapability::Embedding]),
        );
        assert_eq!(p.name(), "named");
        assert_eq!(p.default_model(), Some("m1"));
        assert!(p.supports_capability(ModelCapability::Embedding));
        assert!(!p.supports_capability(ModelCapability::Chat));
    }
}
