//! Provider registry: owns provider instances and indexes them by capability.
//!
//! The registry is the single source of truth for "which provider supports
//! capability X" and "what models exist system-wide". Registration order is
//! preserved and doubles as the default fallback order used by the
//! [`ProviderManager`](crate::ProviderManager).
//!
//! Availability is never cached: every call that needs it probes each
//! provider again, so a backend that comes back mid-run is picked up on the
//! next dispatch.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, info};

use crate::providers::{Provider, ProviderConfig};
use crate::{Error, ModelCapability, ModelInfo, Result};

/// Builds a provider from its config.
///
/// Implemented for any `Fn(ProviderConfig) -> Result<Arc<dyn Provider>>`, so a
/// closure or a constructor wrapper can be registered directly.
pub trait ProviderFactory: Send + Sync {
    /// Construct a provider bound to `config`.
    fn create(&self, config: ProviderConfig) -> Result<Arc<dyn Provider>>;
}

impl<F> ProviderFactory for F
where
    F: Fn(ProviderConfig) -> Result<Arc<dyn Provider>> + Send + Sync,
{
    fn create(&self, config: ProviderConfig) -> Result<Arc<dyn Provider>> {
        self(config)
    }
}

/// Per-provider entry in a [`RegistrySummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSummary {
    pub name: String,
    pub available: bool,
    pub capabilities: Vec<ModelCapability>,
    pub default_model: Option<String>,
}

/// Diagnostic snapshot of the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrySummary {
    pub total_providers: usize,
    pub available_providers: usize,
    /// Type names with a registered factory, sorted.
    pub registered_types: Vec<String>,
    /// One entry per provider, in registration order.
    pub providers: Vec<ProviderSummary>,
}

#[derive(Default)]
struct Inner {
    /// Provider instances in registration order; names are unique.
    providers: Vec<Arc<dyn Provider>>,
    /// Factories keyed by type name.
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

/// Registry of provider instances and provider factories.
///
/// All methods take `&self`; the registry is meant to be shared behind an
/// `Arc` with a [`ProviderManager`](crate::ProviderManager). The internal lock
/// is only held while copying handles in or out, never across a network call.
#[derive(Default)]
pub struct ProviderRegistry {
    inner: RwLock<Inner>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Vec<Arc<dyn Provider>> {
        self.read().providers.clone()
    }

    /// Register a factory under a type name. Replaces any previous factory
    /// with the same name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `name` is empty.
    pub fn register_provider_class<F>(&self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: ProviderFactory + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Configuration(
                "provider type name must not be empty".to_string(),
            ));
        }
        info!(provider_type = %name, "registered provider factory");
        self.write().factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Construct a provider with the factory registered under the config's
    /// own name and store it.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownProviderType` if no factory is registered under
    /// `config.name()`, or whatever the factory returns.
    pub fn add_provider(&self, config: ProviderConfig) -> Result<()> {
        let type_name = config.name().to_string();
        self.add_provider_of_type(config, &type_name)
    }

    /// Construct a provider with the factory registered under `type_name`.
    pub fn add_provider_of_type(&self, config: ProviderConfig, type_name: &str) -> Result<()> {
        let factory = self
            .read()
            .factories
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::UnknownProviderType(type_name.to_string()))?;
        self.add_provider_with(config, factory.as_ref())
    }

    /// Construct a provider with an explicit factory and store it under
    /// `config.name()`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the factory hands back a provider
    /// bound to a different name.
    pub fn add_provider_with(
        &self,
        config: ProviderConfig,
        factory: &dyn ProviderFactory,
    ) -> Result<()> {
        let expected = config.name().to_string();
        let provider = factory.create(config)?;
        if provider.name() != expected {
            return Err(Error::Configuration(format!(
                "factory produced provider '{}' for config '{}'",
                provider.name(),
                expected
            )));
        }
        self.insert_provider(provider);
        Ok(())
    }

    /// Store an already-built provider under its name.
    ///
    /// An existing provider with the same name is replaced in place, keeping
    /// its position in the fallback order.
    pub fn insert_provider(&self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        let mut inner = self.write();
        match inner.providers.iter().position(|p| p.name() == name) {
            Some(idx) => {
                debug!(provider = %name, "replacing existing provider");
                inner.providers[idx] = provider;
            }
            None => inner.providers.push(provider),
        }
        info!(provider = %name, "added provider instance");
    }

    /// Get a provider by name.
    pub fn get_provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.read()
            .providers
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// Names of all providers, available or not, in registration order.
    pub fn list_providers(&self) -> Vec<String> {
        self.read()
            .providers
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().providers.is_empty()
    }

    /// Providers whose availability probe currently succeeds, in
    /// registration order. Probes run one after another on every call.
    pub async fn get_available_providers(&self) -> Vec<Arc<dyn Provider>> {
        let mut available = Vec::new();
        for provider in self.snapshot() {
            if provider.check_availability().await {
                available.push(provider);
            } else {
                debug!(provider = provider.name(), "provider is not available");
            }
        }
        available
    }

    /// Providers that declare `capability`, in registration order.
    ///
    /// This looks at declared capabilities only and does not probe.
    pub fn find_providers_by_capability(
        &self,
        capability: ModelCapability,
    ) -> Vec<Arc<dyn Provider>> {
        self.read()
            .providers
            .iter()
            .filter(|p| p.supports_capability(capability))
            .cloned()
            .collect()
    }

    /// Models of every available provider, concatenated in registration order.
    pub async fn get_all_models(&self) -> Vec<ModelInfo> {
        let mut models = Vec::new();
        for provider in self.get_available_providers().await {
            let listed = provider.list_models().await;
            debug!(provider = provider.name(), count = listed.len(), "listed models");
            models.extend(listed);
        }
        models
    }

    /// Models that declare `capability`.
    pub async fn find_models_by_capability(&self, capability: ModelCapability) -> Vec<ModelInfo> {
        self.get_all_models()
            .await
            .into_iter()
            .filter(|m| m.supports(capability))
            .collect()
    }

    /// Cheapest model, optionally filtered by capability and free tier.
    ///
    /// Free-tier models always rank ahead of paid ones regardless of the
    /// nominal price; ties then break on ascending cost, with an unknown cost
    /// ranking last. Equal keys keep catalog order.
    pub async fn get_cheapest_model(
        &self,
        capability: Option<ModelCapability>,
        free_only: bool,
    ) -> Option<ModelInfo> {
        let candidates = self
            .get_all_models()
            .await
            .into_iter()
            .filter(|m| capability.is_none_or(|cap| m.supports(cap)))
            .filter(|m| !free_only || m.free_tier);
        cheapest(candidates)
    }

    /// Remove a provider. Returns `false` if it was not registered.
    pub fn remove_provider(&self, name: &str) -> bool {
        let mut inner = self.write();
        let before = inner.providers.len();
        inner.providers.retain(|p| p.name() != name);
        let removed = inner.providers.len() != before;
        if removed {
            info!(provider = %name, "removed provider");
        }
        removed
    }

    /// Remove every provider. Registered factories are kept.
    pub fn clear(&self) {
        self.write().providers.clear();
        info!("cleared all providers from registry");
    }

    /// Snapshot of the registry, probing each provider once.
    pub async fn get_summary(&self) -> RegistrySummary {
        let registered_types = self.read().factories.keys().cloned().collect();

        let mut providers = Vec::new();
        for provider in self.snapshot() {
            providers.push(ProviderSummary {
                name: provider.name().to_string(),
                available: provider.check_availability().await,
                capabilities: provider.config().capabilities().to_vec(),
                default_model: provider.default_model().map(String::from),
            });
        }

        RegistrySummary {
            total_providers: providers.len(),
            available_providers: providers.iter().filter(|p| p.available).count(),
            registered_types,
            providers,
        }
    }
}

/// Pick the cheapest model: free tier first, then ascending effective cost.
fn cheapest(models: impl IntoIterator<Item = ModelInfo>) -> Option<ModelInfo> {
    let mut models: Vec<ModelInfo> = models.into_iter().collect();
    models.sort_by(|a, b| {
        b.free_tier
            .cmp(&a.free_tier)
            .then_with(|| a.effective_cost().total_cmp(&b.effective_cost()))
    });
    models.into_iter().next()
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("ProviderRegistry")
            .field(
                "providers",
                &inner.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("factories", &inner.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
