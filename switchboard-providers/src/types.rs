//! Core types for capability-based routing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// What kind of work a provider or model can perform.
///
/// Used both to declare support (on [`ProviderConfig`](crate::ProviderConfig)
/// and [`ModelInfo`]) and to filter candidates during dispatch.
///
/// # Examples
///
/// ```
/// use switchboard_providers::ModelCapability;
///
/// let cap: ModelCapability = "code_generation".parse().unwrap();
/// assert_eq!(cap, ModelCapability::CodeGeneration);
/// assert_eq!(cap.to_string(), "code_generation");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCapability {
    TextGeneration,
    Chat,
    CodeGeneration,
    Translation,
    Summarization,
    Embedding,
    ImageGeneration,
    AudioGeneration,
    VideoGeneration,
    Moderation,
}

impl ModelCapability {
    /// Every capability, in declaration order.
    pub const ALL: [ModelCapability; 10] = [
        Self::TextGeneration,
        Self::Chat,
        Self::CodeGeneration,
        Self::Translation,
        Self::Summarization,
        Self::Embedding,
        Self::ImageGeneration,
        Self::AudioGeneration,
        Self::VideoGeneration,
        Self::Moderation,
    ];

    /// The snake_case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextGeneration => "text_generation",
            Self::Chat => "chat",
            Self::CodeGeneration => "code_generation",
            Self::Translation => "translation",
            Self::Summarization => "summarization",
            Self::Embedding => "embedding",
            Self::ImageGeneration => "image_generation",
            Self::AudioGeneration => "audio_generation",
            Self::VideoGeneration => "video_generation",
            Self::Moderation => "moderation",
        }
    }
}

impl fmt::Display for ModelCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelCapability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| Error::UnknownCapability(s.to_string()))
    }
}

/// Information about a model offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Backend model identifier (what gets sent on the wire).
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Name of the owning provider.
    pub provider: String,
    /// What the model can do.
    pub capabilities: Vec<ModelCapability>,
    /// Maximum context window size in tokens.
    pub context_length: Option<u32>,
    /// Cost per token in USD, if known.
    pub cost_per_token: Option<f64>,
    /// Usable at zero marginal cost.
    pub free_tier: bool,
    pub description: Option<String>,
}

impl ModelInfo {
    /// Create a new model info builder. The display name defaults to `id`.
    pub fn builder(provider: &str, id: &str) -> ModelInfoBuilder {
        ModelInfoBuilder::new(provider, id)
    }

    /// Cost used for ranking. Unknown cost never counts as cheap.
    pub fn effective_cost(&self) -> f64 {
        self.cost_per_token.unwrap_or(f64::INFINITY)
    }

    /// Whether this model declares `capability`.
    pub fn supports(&self, capability: ModelCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Builder for constructing `ModelInfo`.
#[derive(Debug)]
pub struct ModelInfoBuilder {
    id: String,
    name: Option<String>,
    provider: String,
    capabilities: Vec<ModelCapability>,
    context_length: Option<u32>,
    cost_per_token: Option<f64>,
    free_tier: bool,
    description: Option<String>,
}

impl ModelInfoBuilder {
    fn new(provider: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            provider: provider.to_string(),
            capabilities: Vec::new(),
            context_length: None,
            cost_per_token: None,
            free_tier: false,
            description: None,
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the model capabilities.
    pub fn capabilities(mut self, caps: impl IntoIterator<Item = ModelCapability>) -> Self {
        self.capabilities = caps.into_iter().collect();
        self
    }

    /// Set the context window size.
    pub fn context_length(mut self, tokens: u32) -> Self {
        self.context_length = Some(tokens);
        self
    }

    /// Set the cost per token.
    pub fn cost_per_token(mut self, cost: f64) -> Self {
        self.cost_per_token = Some(cost);
        self
    }

    /// Mark as usable on a free tier.
    pub fn free_tier(mut self) -> Self {
        self.free_tier = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build the `ModelInfo`.
    pub fn build(self) -> ModelInfo {
        ModelInfo {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            provider: self.provider,
            capabilities: self.capabilities,
            context_length: self.context_length,
            cost_per_token: self.cost_per_token,
            free_tier: self.free_tier,
            description: self.description,
        }
    }
}

/// Audience rating returned by content moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentRating {
    G,
    #[serde(rename = "PG")]
    Pg,
    #[serde(rename = "PG-13")]
    Pg13,
    R,
    Unknown,
}

/// Outcome of [`Provider::moderate_content`](crate::Provider::moderate_content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationResult {
    pub safe: bool,
    pub concerns: Vec<String>,
    pub rating: ContentRating,
}

impl ModerationResult {
    /// Returned whenever no usable verdict could be obtained.
    pub fn unknown() -> Self {
        Self {
            safe: true,
            concerns: Vec::new(),
            rating: ContentRating::Unknown,
        }
    }

    /// Extract a verdict from free-form model output.
    ///
    /// Takes the span between the first `{` and the last `}` and parses it.
    /// Anything unparseable yields [`ModerationResult::unknown`].
    pub fn from_response(text: &str) -> Self {
        let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
            return Self::unknown();
        };
        if end <= start {
            return Self::unknown();
        }

        match serde_json::from_str(&text[start..=end]) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "failed to parse moderation response");
                Self::unknown()
            }
        }
    }
}
