//! Provider manager: ordered fallback, load balancing, and usage accounting.
//!
//! The manager turns "give me an answer" into a sequence of attempts against
//! the providers of one [`ProviderRegistry`]. Every public operation returns a
//! value or `None`/an empty collection; provider errors are logged and
//! absorbed in [`ProviderManager::attempt`] and never reach the caller.
//!
//! # Candidate Order
//!
//! ```text
//! preferred (if it exists, is available, and has the capability)
//!     │
//!     ▼
//! capability matches (registration order)  ─or─  all available providers
//!     │
//!     ▼
//! stable sort by request count  (load balancing only)
//!     │
//!     ▼
//! try each once; first non-empty answer wins
//! ```
//!
//! Sub-requests are always issued one at a time, including in
//! [`compare_responses`](ProviderManager::compare_responses) and
//! [`batch_query`](ProviderManager::batch_query).

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::providers::{Message, Provider, QueryOptions};
use crate::registry::ProviderRegistry;
use crate::{ModelCapability, Result};

/// Snapshot of the manager's counters and toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    /// Successful requests per provider name.
    pub request_counts: BTreeMap<String, u64>,
    pub total_requests: u64,
    /// Number of providers with at least one counted request.
    pub providers_used: usize,
    pub fallback_enabled: bool,
    pub load_balancing: bool,
}

/// What to send to each candidate.
enum Request<'a> {
    Query(&'a str),
    Chat(&'a [Message]),
}

/// Dispatches requests across the providers of a registry.
pub struct ProviderManager {
    registry: Arc<ProviderRegistry>,
    fallback_enabled: AtomicBool,
    load_balancing: AtomicBool,
    request_counts: Mutex<HashMap<String, u64>>,
}

impl ProviderManager {
    /// Create a manager over `registry` with fallback on and load balancing off.
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            fallback_enabled: AtomicBool::new(true),
            load_balancing: AtomicBool::new(false),
            request_counts: Mutex::new(HashMap::new()),
        }
    }

    /// The registry this manager dispatches over.
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn is_fallback_enabled(&self) -> bool {
        self.fallback_enabled.load(Ordering::SeqCst)
    }

    pub fn is_load_balancing(&self) -> bool {
        self.load_balancing.load(Ordering::SeqCst)
    }

    /// Enable or disable moving on to the next candidate after a failure.
    pub fn enable_fallback(&self, enabled: bool) {
        self.fallback_enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "fallback {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Enable or disable ordering candidates by request count.
    pub fn enable_load_balancing(&self, enabled: bool) {
        self.load_balancing.store(enabled, Ordering::SeqCst);
        info!(
            enabled,
            "load balancing {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    fn counts(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.request_counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn track_usage(&self, provider: &str) {
        *self.counts().entry(provider.to_string()).or_insert(0) += 1;
    }

    /// Requests counted for `provider` so far.
    pub fn request_count(&self, provider: &str) -> u64 {
        self.counts().get(provider).copied().unwrap_or(0)
    }

    /// Snapshot of usage counters and toggles.
    pub fn usage_stats(&self) -> UsageStats {
        let request_counts: BTreeMap<String, u64> = self
            .counts()
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        UsageStats {
            total_requests: request_counts.values().sum(),
            providers_used: request_counts.len(),
            request_counts,
            fallback_enabled: self.is_fallback_enabled(),
            load_balancing: self.is_load_balancing(),
        }
    }

    /// Zero all usage counters.
    pub fn reset_usage_stats(&self) {
        self.counts().clear();
        info!("usage statistics reset");
    }

    /// Query with automatic fallback.
    ///
    /// `preferred` goes first when it exists, is available, and declares
    /// `capability` (if given). Returns the first non-empty answer, or `None`
    /// when every candidate failed or fallback is off and the first one did.
    pub async fn query_with_fallback(
        &self,
        prompt: &str,
        preferred: Option<&str>,
        capability: Option<ModelCapability>,
        options: QueryOptions,
    ) -> Option<String> {
        let candidates = self.ordered_providers(preferred, capability).await;
        self.dispatch(&candidates, Request::Query(prompt), options).await
    }

    /// Chat with automatic fallback across providers declaring
    /// [`ModelCapability::Chat`].
    pub async fn chat_with_fallback(
        &self,
        messages: &[Message],
        preferred: Option<&str>,
        options: QueryOptions,
    ) -> Option<String> {
        let candidates = self
            .ordered_providers(preferred, Some(ModelCapability::Chat))
            .await;
        self.dispatch(&candidates, Request::Chat(messages), options)
            .await
    }

    /// Pick one provider for `capability`.
    ///
    /// With `prefer_free`, the first match (registration order) whose catalog
    /// has a free-tier model wins. Otherwise, or if none has one, the least
    /// used match when load balancing is on, else the first match.
    pub async fn find_best_provider(
        &self,
        capability: ModelCapability,
        prefer_free: bool,
    ) -> Option<Arc<dyn Provider>> {
        let providers = self.registry.find_providers_by_capability(capability);
        if providers.is_empty() {
            debug!(%capability, "no provider declares capability");
            return None;
        }

        if prefer_free {
            for provider in &providers {
                if provider.list_models().await.iter().any(|m| m.free_tier) {
                    return Some(Arc::clone(provider));
                }
            }
        }

        if self.is_load_balancing() {
            let counts = self.counts();
            return providers
                .into_iter()
                .min_by_key(|p| counts.get(p.name()).copied().unwrap_or(0));
        }

        providers.into_iter().next()
    }

    /// Ask several providers the same prompt, one after another.
    ///
    /// With `providers = None` every currently available provider is asked;
    /// otherwise the named ones (unknown and repeated names are skipped).
    /// Each asked provider is queried once and gets exactly one entry: its answer, `""` for an empty
    /// answer, or `"Error: <message>"` if it failed.
    pub async fn compare_responses(
        &self,
        prompt: &str,
        providers: Option<&[&str]>,
        options: QueryOptions,
    ) -> BTreeMap<String, String> {
        let instances = match providers {
            None => self.registry.get_available_providers().await,
            Some(names) => names
                .iter()
                .enumerate()
                .filter(|(i, name)| !names[..*i].contains(*name))
                .filter_map(|(_, name)| {
                    let provider = self.registry.get_provider(name);
                    if provider.is_none() {
                        warn!(provider = %name, "provider not found, skipping comparison");
                    }
                    provider
                })
                .collect(),
        };

        let mut responses = BTreeMap::new();
        for provider in instances {
            let entry = match self
                .attempt(provider.as_ref(), &Request::Query(prompt), options.clone())
                .await
            {
                Ok(Some(text)) if !text.is_empty() => {
                    self.track_usage(provider.name());
                    text
                }
                Ok(_) => String::new(),
                Err(e) => format!("Error: {e}"),
            };
            responses.insert(provider.name().to_string(), entry);
        }
        responses
    }

    /// Send every prompt to one provider, in order.
    ///
    /// The provider is `provider` by name, or the best
    /// [`ModelCapability::TextGeneration`] provider. A failing prompt yields
    /// `None` at its position without stopping the rest; if no provider
    /// resolves, every position is `None`.
    pub async fn batch_query<S: AsRef<str>>(
        &self,
        prompts: &[S],
        provider: Option<&str>,
        options: QueryOptions,
    ) -> Vec<Option<String>> {
        let resolved = match provider {
            Some(name) => {
                let found = self.registry.get_provider(name);
                if found.is_none() {
                    error!(provider = %name, "provider not found");
                }
                found
            }
            None => {
                let found = self
                    .find_best_provider(ModelCapability::TextGeneration, true)
                    .await;
                if found.is_none() {
                    error!("no suitable provider found");
                }
                found
            }
        };

        let Some(provider) = resolved else {
            return vec![None; prompts.len()];
        };

        let mut responses = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let request = Request::Query(prompt.as_ref());
            match self.attempt(provider.as_ref(), &request, options.clone()).await {
                Ok(response) => {
                    self.track_usage(provider.name());
                    responses.push(response);
                }
                Err(_) => responses.push(None),
            }
        }
        responses
    }

    /// Build the ordered candidate list for a fallback dispatch.
    async fn ordered_providers(
        &self,
        preferred: Option<&str>,
        capability: Option<ModelCapability>,
    ) -> Vec<Arc<dyn Provider>> {
        let mut providers: Vec<Arc<dyn Provider>> = Vec::new();

        if let Some(provider) = preferred.and_then(|name| self.registry.get_provider(name))
            && capability.is_none_or(|cap| provider.supports_capability(cap))
            && provider.check_availability().await
        {
            providers.push(provider);
        }

        let others = match capability {
            Some(cap) => self.registry.find_providers_by_capability(cap),
            None => self.registry.get_available_providers().await,
        };
        for provider in others {
            if !providers.iter().any(|p| p.name() == provider.name()) {
                providers.push(provider);
            }
        }

        if self.is_load_balancing() && providers.len() > 1 {
            let counts = self.counts();
            providers.sort_by_key(|p| counts.get(p.name()).copied().unwrap_or(0));
        }

        providers
    }

    /// Try candidates in order until one returns non-empty text.
    async fn dispatch(
        &self,
        candidates: &[Arc<dyn Provider>],
        request: Request<'_>,
        options: QueryOptions,
    ) -> Option<String> {
        for provider in candidates {
            match self
                .attempt(provider.as_ref(), &request, options.clone())
                .await
            {
                Ok(Some(text)) if !text.is_empty() => {
                    self.track_usage(provider.name());
                    return Some(text);
                }
                Ok(_) => warn!(provider = provider.name(), "provider returned empty response"),
                Err(_) => {}
            }

            if !self.is_fallback_enabled() {
                debug!(provider = provider.name(), "fallback disabled, stopping");
                return None;
            }
        }

        error!(candidates = candidates.len(), "all providers failed");
        None
    }

    /// The one place provider errors are caught: log and hand back.
    async fn attempt(
        &self,
        provider: &dyn Provider,
        request: &Request<'_>,
        options: QueryOptions,
    ) -> Result<Option<String>> {
        debug!(provider = provider.name(), "trying provider");
        let result = match request {
            Request::Query(prompt) => provider.query(prompt, options).await,
            Request::Chat(messages) => provider.chat(messages, options).await,
        };
        if let Err(e) = &result {
            error!(provider = provider.name(), error = %e, "provider failed");
        }
        result
    }
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new(Arc::new(ProviderRegistry::new()))
    }
}

impl std::fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderManager")
            .field("registry", &self.registry)
            .field("fallback_enabled", &self.is_fallback_enabled())
            .field("load_balancing", &self.is_load_balancing())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{MockProvider, MockReply, ProviderConfig};

    fn mock(name: &str, caps: &[ModelCapability]) -> MockProvider {
        MockProvider::new(
            ProviderConfig::new(name)
                .unwrap()
                .with_capabilities(caps.iter().copied()),
        )
    }

    fn setup(providers: Vec<Arc<MockProvider>>) -> ProviderManager {
        let registry = Arc::new(ProviderRegistry::new());
        for p in providers {
            registry.insert_provider(p);
        }
        ProviderManager::new(registry)
    }

    #[test]
    fn defaults() {
        let manager = ProviderManager::default();
        assert!(manager.is_fallback_enabled());
        assert!(!manager.is_load_balancing());
        assert_eq!(manager.usage_stats().total_requests, 0);
    }

    #[tokio::test]
    async fn preferred_provider_goes_first() {
        let a = Arc::new(mock("a", &[]));
        let b = Arc::new(mock("b", &[]));
        let manager = setup(vec![a.clone(), b.clone()]);

        let out = manager
            .query_with_fallback("hi", Some("b"), None, QueryOptions::new())
            .await;
        assert_eq!(out.as_deref(), Some("b: hi"));
        assert_eq!(a.call_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_preferred_is_not_promoted() {
        let a = Arc::new(mock("a", &[]));
        let b = Arc::new(mock("b", &[]).unavailable());
        let manager = setup(vec![a.clone(), b.clone()]);

        let out = manager
            .query_with_fallback("hi", Some("b"), None, QueryOptions::new())
            .await;
        assert_eq!(out.as_deref(), Some("a: hi"));
        assert_eq!(b.call_count(), 0);
    }

    #[tokio::test]
    async fn preferred_without_capability_is_not_promoted() {
        let a = Arc::new(mock("a", &[ModelCapability::Chat]));
        let b = Arc::new(mock("b", &[]));
        let manager = setup(vec![a.clone(), b.clone()]);

        let out = manager
            .query_with_fallback(
                "hi",
                Some("b"),
                Some(ModelCapability::Chat),
                QueryOptions::new(),
            )
            .await;
        assert_eq!(out.as_deref(), Some("a: hi"));
        assert_eq!(b.call_count(), 0);
    }

    #[tokio::test]
    async fn preferred_is_not_tried_twice() {
        let a = Arc::new(mock("a", &[]).with_reply(MockReply::Empty));
        let manager = setup(vec![a.clone()]);

        assert!(manager
            .query_with_fallback("hi", Some("a"), None, QueryOptions::new())
            .await
            .is_none());
        assert_eq!(a.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_response_advances_to_next() {
        let a = Arc::new(mock("a", &[]).with_reply(MockReply::Empty));
        let b = Arc::new(mock("b", &[]).with_reply(MockReply::text("")));
        let c = Arc::new(mock("c", &[]));
        let manager = setup(vec![a, b, c]);

        let out = manager
            .query_with_fallback("x", None, None, QueryOptions::new())
            .await;
        assert_eq!(out.as_deref(), Some("c: x"));
        assert_eq!(manager.request_count("a"), 0);
        assert_eq!(manager.request_count("b"), 0);
        assert_eq!(manager.request_count("c"), 1);
    }

    #[tokio::test]
    async fn fallback_disabled_stops_on_empty() {
        let a = Arc::new(mock("a", &[]).with_reply(MockReply::Empty));
        let b = Arc::new(mock("b", &[]));
        let manager = setup(vec![a, b.clone()]);
        manager.enable_fallback(false);

        assert!(manager
            .query_with_fallback("x", None, None, QueryOptions::new())
            .await
            .is_none());
        assert_eq!(b.call_count(), 0);
    }

    #[tokio::test]
    async fn all_failing_returns_none() {
        let a = Arc::new(mock("a", &[]).with_reply(MockReply::fail("down")));
        let b = Arc::new(mock("b", &[]).with_reply(MockReply::fail("down")));
        let manager = setup(vec![a.clone(), b.clone()]);

        assert!(manager
            .query_with_fallback("x", None, None, QueryOptions::new())
            .await
            .is_none());
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        assert_eq!(manager.usage_stats().total_requests, 0);
    }

    #[tokio::test]
    async fn no_candidates_returns_none() {
        let manager = ProviderManager::default();
        assert!(manager
            .query_with_fallback("x", Some("ghost"), None, QueryOptions::new())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn capability_candidates_are_not_probed() {
        // Matches the declared-capability path: availability is only checked
        // for the preferred provider and the uncapped path.
        let down = Arc::new(mock("down", &[ModelCapability::Summarization]).unavailable());
        let manager = setup(vec![down.clone()]);

        let out = manager
            .query_with_fallback(
                "x",
                None,
                Some(ModelCapability::Summarization),
                QueryOptions::new(),
            )
            .await;
        assert_eq!(out.as_deref(), Some("down: x"));
    }

    #[tokio::test]
    async fn uncapped_path_skips_unavailable() {
        let down = Arc::new(mock("down", &[]).unavailable());
        let up = Arc::new(mock("up", &[]));
        let manager = setup(vec![down.clone(), up]);

        let out = manager
            .query_with_fallback("x", None, None, QueryOptions::new())
            .await;
        assert_eq!(out.as_deref(), Some("up: x"));
        assert_eq!(down.call_count(), 0);
    }

    #[tokio::test]
    async fn chat_uses_chat_capable_providers_only() {
        let plain = Arc::new(mock("plain", &[ModelCapability::TextGeneration]));
        let chatty = Arc::new(mock("chatty", &[ModelCapability::Chat]));
        let manager = setup(vec![plain.clone(), chatty.clone()]);

        let out = manager
            .chat_with_fallback(&[Message::user("hello")], None, QueryOptions::new())
            .await;
        assert_eq!(out.as_deref(), Some("chatty: user: hello"));
        assert_eq!(plain.call_count(), 0);
        assert_eq!(manager.request_count("chatty"), 1);
    }

    #[tokio::test]
    async fn chat_falls_back_after_error() {
        let a = Arc::new(mock("a", &[ModelCapability::Chat]).with_reply(MockReply::fail("x")));
        let b = Arc::new(mock("b", &[ModelCapability::Chat]).with_reply(MockReply::text("ok")));
        let manager = setup(vec![a, b]);

        let out = manager
            .chat_with_fallback(&[Message::user("hi")], None, QueryOptions::new())
            .await;
        assert_eq!(out.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn load_balancing_orders_by_request_count() {
        let a = Arc::new(mock("a", &[]));
        let b = Arc::new(mock("b", &[]));
        let manager = setup(vec![a, b]);
        manager.enable_load_balancing(true);

        let first = manager
            .query_with_fallback("1", None, None, QueryOptions::new())
            .await;
        let second = manager
            .query_with_fallback("2", None, None, QueryOptions::new())
            .await;
        assert_eq!(first.as_deref(), Some("a: 1"));
        assert_eq!(second.as_deref(), Some("b: 2"));
    }

    #[tokio::test]
    async fn load_balancing_can_demote_preferred() {
        let a = Arc::new(mock("a", &[]));
        let b = Arc::new(mock("b", &[]));
        let manager = setup(vec![a, b]);
        manager.enable_load_balancing(true);

        manager
            .query_with_fallback("warm", Some("b"), None, QueryOptions::new())
            .await;
        let out = manager
            .query_with_fallback("next", Some("b"), None, QueryOptions::new())
            .await;
        assert_eq!(out.as_deref(), Some("a: next"));
    }

    #[tokio::test]
    async fn best_provider_prefers_free_catalog() {
        let paid = Arc::new(mock("paid", &[ModelCapability::TextGeneration]).with_models(vec![
            crate::ModelInfo::builder("paid", "gpt").cost_per_token(0.1).build(),
        ]));
        let free = Arc::new(mock("free", &[ModelCapability::TextGeneration]).with_models(vec![
            crate::ModelInfo::builder("free", "llama").free_tier().build(),
        ]));
        let manager = setup(vec![paid, free]);

        let best = manager
            .find_best_provider(ModelCapability::TextGeneration, true)
            .await
            .unwrap();
        assert_eq!(best.name(), "free");

        let first = manager
            .find_best_provider(ModelCapability::TextGeneration, false)
            .await
            .unwrap();
        assert_eq!(first.name(), "paid");
    }

    #[tokio::test]
    async fn best_provider_uses_least_used_when_balancing() {
        let a = Arc::new(mock("a", &[ModelCapability::Chat]));
        let b = Arc::new(mock("b", &[ModelCapability::Chat]));
        let c = Arc::new(mock("c", &[ModelCapability::Chat]));
        let manager = setup(vec![a, b, c]);
        manager.enable_load_balancing(true);

        manager.track_usage("a");
        let best = manager
            .find_best_provider(ModelCapability::Chat, false)
            .await
            .unwrap();
        assert_eq!(best.name(), "b");
    }

    #[tokio::test]
    async fn best_provider_none_without_match() {
        let manager = setup(vec![Arc::new(mock("a", &[ModelCapability::Chat]))]);
        assert!(manager
            .find_best_provider(ModelCapability::Embedding, true)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn compare_records_every_provider() {
        let a = Arc::new(mock("a", &[]).with_reply(MockReply::fail("rate limited")));
        let b = Arc::new(mock("b", &[]).with_reply(MockReply::Empty));
        let c = Arc::new(mock("c", &[]));
        let manager = setup(vec![a, b, c]);

        let results = manager
            .compare_responses("q", Some(&["a", "b", "c", "ghost"][..]), QueryOptions::new())
            .await;
        assert_eq!(results.len(), 3);
        assert_eq!(results["a"], "Error: backend error: rate limited");
        assert_eq!(results["b"], "");
        assert_eq!(results["c"], "c: q");
        assert_eq!(manager.request_count("c"), 1);
        assert_eq!(manager.request_count("a"), 0);
    }

    #[tokio::test]
    async fn compare_asks_repeated_name_once() {
        let a = Arc::new(mock("a", &[]));
        let manager = setup(vec![a.clone()]);

        let results = manager
            .compare_responses("q", Some(&["a", "a"][..]), QueryOptions::new())
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(a.call_count(), 1);
        assert_eq!(manager.request_count("a"), 1);
    }

    #[tokio::test]
    async fn compare_defaults_to_available_providers() {
        let up = Arc::new(mock("up", &[]));
        let down = Arc::new(mock("down", &[]).unavailable());
        let manager = setup(vec![up, down.clone()]);

        let results = manager.compare_responses("q", None, QueryOptions::new()).await;
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["up"]);
        assert_eq!(down.call_count(), 0);
    }

    #[tokio::test]
    async fn batch_resolves_best_text_provider() {
        let chat_only = Arc::new(mock("chat", &[ModelCapability::Chat]));
        let writer = Arc::new(mock("writer", &[ModelCapability::TextGeneration]));
        let manager = setup(vec![chat_only.clone(), writer]);

        let out = manager
            .batch_query(&["one", "two"], None, QueryOptions::new())
            .await;
        assert_eq!(
            out,
            vec![Some("writer: one".to_string()), Some("writer: two".to_string())]
        );
        assert_eq!(chat_only.call_count(), 0);
        assert_eq!(manager.request_count("writer"), 2);
    }

    #[tokio::test]
    async fn batch_with_unknown_provider_is_all_none() {
        let manager = setup(vec![Arc::new(mock("a", &[]))]);
        let out = manager
            .batch_query(&["x", "y", "z"], Some("ghost"), QueryOptions::new())
            .await;
        assert_eq!(out, vec![None, None, None]);
    }

    #[tokio::test]
    async fn batch_without_any_provider_is_all_none() {
        let manager = ProviderManager::default();
        let prompts: Vec<String> = vec!["x".into()];
        assert_eq!(
            manager.batch_query(&prompts, None, QueryOptions::new()).await,
            vec![None]
        );
    }

    #[tokio::test]
    async fn reset_clears_counts_but_not_toggles() {
        let manager = setup(vec![Arc::new(mock("a", &[]))]);
        manager.enable_load_balancing(true);
        manager
            .query_with_fallback("x", None, None, QueryOptions::new())
            .await;

        let stats = manager.usage_stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.providers_used, 1);
        assert!(stats.load_balancing);

        manager.reset_usage_stats();
        let stats = manager.usage_stats();
        assert!(stats.request_counts.is_empty());
        assert_eq!(stats.total_requests, 0);
        assert!(stats.load_balancing);
        assert!(stats.fallback_enabled);
    }

    #[test]
    fn usage_stats_serialize() {
        let manager = ProviderManager::default();
        manager.track_usage("a");
        manager.track_usage("a");
        let json = serde_json::to_value(manager.usage_stats()).unwrap();
        assert_eq!(json["request_counts"]["a"], 2);
        assert_eq!(json["total_requests"], 2);
        assert_eq!(json["fallback_enabled"], true);
    }
}
