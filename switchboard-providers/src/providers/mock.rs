//! Scripted provider for tests and offline wiring.
//!
//! `MockProvider` answers from a queue of [`MockReply`] values, falling back
//! to a default reply once the queue is drained. Every prompt it receives is
//! recorded so tests can assert which candidates were actually tried.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{Provider, ProviderConfig, QueryOptions};
use crate::{Error, ModelInfo, Result};

/// One scripted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Answer with this text.
    Text(String),
    /// Complete without content (soft failure).
    Empty,
    /// Fail with `Error::Backend` carrying this message.
    Fail(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    fn into_result(self) -> Result<Option<String>> {
        match self {
            MockReply::Text(text) => Ok(Some(text)),
            MockReply::Empty => Ok(None),
            MockReply::Fail(message) => Err(Error::Backend(message)),
        }
    }
}

/// Provider that answers from a script instead of a backend.
///
/// Without any script it echoes `"<name>: <prompt>"`.
pub struct MockProvider {
    config: ProviderConfig,
    default_reply: Option<MockReply>,
    queued: Mutex<VecDeque<MockReply>>,
    per_prompt: HashMap<String, MockReply>,
    models: Vec<ModelInfo>,
    available: AtomicBool,
    calls: Mutex<Vec<(String, QueryOptions)>>,
}

impl MockProvider {
    /// Create an available mock bound to `config`.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            default_reply: None,
            queued: Mutex::new(VecDeque::new()),
            per_prompt: HashMap::new(),
            models: Vec::new(),
            available: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply used once the queue is empty.
    pub fn with_reply(mut self, reply: MockReply) -> Self {
        self.default_reply = Some(reply);
        self
    }

    /// Fixed reply for one exact prompt. Takes precedence over the queue.
    pub fn with_prompt_reply(mut self, prompt: impl Into<String>, reply: MockReply) -> Self {
        self.per_prompt.insert(prompt.into(), reply);
        self
    }

    /// Catalog returned by `list_models`.
    pub fn with_models(mut self, models: Vec<ModelInfo>) -> Self {
        self.models = models;
        self
    }

    /// Start unavailable.
    pub fn unavailable(self) -> Self {
        self.set_available(false);
        self
    }

    /// Queue a reply for the next call.
    pub fn queue(&self, reply: MockReply) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Flip what `check_availability` reports.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `query` calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Prompts received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    /// Options passed to the most recent call.
    pub fn last_options(&self) -> Option<QueryOptions> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|(_, options)| options.clone())
    }

    fn next_reply(&self, prompt: &str) -> MockReply {
        if let Some(reply) = self.per_prompt.get(prompt) {
            return reply.clone();
        }
        let queued = self
            .queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        queued
            .or_else(|| self.default_reply.clone())
            .unwrap_or_else(|| MockReply::Text(format!("{}: {}", self.config.name(), prompt)))
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn query(&self, prompt: &str, options: QueryOptions) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((prompt.to_string(), options));
        self.next_reply(prompt).into_result()
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        if !self.models.is_empty() {
            return self.models.clone();
        }
        let id = self.config.default_model().unwrap_or("mock-model");
        vec![
            ModelInfo::builder(self.config.name(), id)
                .capabilities(self.config.capabilities().iter().copied())
                .description("Built-in mock model")
                .build(),
        ]
    }

    async fn check_availability(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
