//! Declarative provider configuration.
//!
//! A providers document is a TOML file with an optional `[manager]` table and
//! any number of `[[providers]]` records:
//!
//! ```toml
//! [manager]
//! fallback_enabled = true
//! load_balancing = false
//!
//! [[providers]]
//! name = "local"
//! type = "ollama"
//! endpoint = "http://localhost:11434"
//! default_model = "llama2"
//! capabilities = ["text_generation", "chat"]
//! ```
//!
//! Records are turned into [`ProviderConfig`] values and handed to a
//! [`ProviderRegistry`]; a record that cannot be built is logged and skipped so
//! one bad entry never takes the others down.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{process_env, resolve_credential};
use crate::manager::ProviderManager;
use crate::providers::{OllamaProvider, Provider, ProviderConfig};
use crate::registry::ProviderRegistry;
use crate::{ModelCapability, Result};

/// Type name of the built-in Ollama factory.
pub const OLLAMA_TYPE: &str = "ollama";

/// Register the factories shipped with this crate.
pub fn register_builtin_factories(registry: &ProviderRegistry) -> Result<()> {
    registry.register_provider_class(OLLAMA_TYPE, build_ollama)
}

fn build_ollama(config: ProviderConfig) -> Result<Arc<dyn Provider>> {
    Ok(Arc::new(OllamaProvider::new(config)?))
}

/// `[manager]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    pub fallback_enabled: bool,
    pub load_balancing: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            load_balancing: false,
        }
    }
}

/// One `[[providers]]` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub name: String,
    /// Factory type name; the provider name is used when absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    /// Inline credential. Takes precedence over `credential_env_var`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_env_var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Request timeout in seconds. Zero keeps the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl ProviderEntry {
    /// Factory type this record resolves to.
    pub fn type_name(&self) -> &str {
        self.provider_type.as_deref().unwrap_or(&self.name)
    }

    /// Build the [`ProviderConfig`] for this record.
    ///
    /// `lookup` resolves `credential_env_var`. Unknown capability strings are
    /// dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the name is empty.
    pub fn to_config<F>(&self, lookup: F) -> Result<ProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let capabilities = self.capabilities.iter().filter_map(|raw| {
            match raw.parse::<ModelCapability>() {
                Ok(cap) => Some(cap),
                Err(e) => {
                    warn!(provider = %self.name, error = %e, "skipping capability");
                    None
                }
            }
        });

        let mut config = ProviderConfig::new(self.name.as_str())?.with_capabilities(capabilities);

        if let Some(key) = resolve_credential(
            self.credential.as_deref(),
            self.credential_env_var.as_deref(),
            lookup,
        ) {
            config = config.with_api_key(key);
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.as_str());
        }
        if let Some(model) = &self.default_model {
            config = config.with_default_model(model.as_str());
        }
        match self.timeout {
            Some(0) => warn!(provider = %self.name, "ignoring zero timeout, using default"),
            Some(secs) => config = config.with_timeout(Duration::from_secs(secs)),
            None => {}
        }
        if let Some(retries) = self.max_retries {
            config = config.with_max_retries(retries);
        }
        for (name, value) in &self.headers {
            config = config.with_header(name.as_str(), value.as_str());
        }

        Ok(config)
    }
}

/// A full providers document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvidersDocument {
    #[serde(default)]
    pub manager: ManagerSettings,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

impl ProvidersDocument {
    /// Parse a document from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Write the document to disk as TOML, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = self.to_toml_string()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::Error::Configuration(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(path, contents).map_err(|e| {
            crate::Error::Configuration(format!("failed to write {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), providers = self.providers.len(), "saved providers document");
        Ok(())
    }

    /// Template with a single local Ollama record.
    pub fn default_document() -> Self {
        Self {
            manager: ManagerSettings::default(),
            providers: vec![ProviderEntry {
                name: OLLAMA_TYPE.to_string(),
                provider_type: Some(OLLAMA_TYPE.to_string()),
                endpoint: Some(crate::providers::ollama::DEFAULT_BASE_URL.to_string()),
                default_model: Some(crate::providers::ollama::DEFAULT_MODEL.to_string()),
                capabilities: vec![
                    ModelCapability::TextGeneration.to_string(),
                    ModelCapability::Chat.to_string(),
                    ModelCapability::CodeGeneration.to_string(),
                ],
                ..Default::default()
            }],
        }
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Configuration(format!("failed to serialize document: {e}")))
    }

    /// Register every record with `registry` and apply the manager toggles,
    /// resolving credential env vars from the process environment.
    ///
    /// Returns the number of providers registered.
    pub fn apply(&self, registry: &ProviderRegistry, manager: &ProviderManager) -> usize {
        self.apply_with_env(registry, manager, process_env)
    }

    /// [`apply`](Self::apply) with a caller-supplied environment lookup.
    pub fn apply_with_env<F>(
        &self,
        registry: &ProviderRegistry,
        manager: &ProviderManager,
        lookup: F,
    ) -> usize
    where
        F: Fn(&str) -> Option<String>,
    {
        if manager.is_fallback_enabled() != self.manager.fallback_enabled {
            manager.enable_fallback(self.manager.fallback_enabled);
        }
        if manager.is_load_balancing() != self.manager.load_balancing {
            manager.enable_load_balancing(self.manager.load_balancing);
        }

        let mut loaded = 0;
        for entry in &self.providers {
            let result = entry
                .to_config(&lookup)
                .and_then(|config| registry.add_provider_of_type(config, entry.type_name()));
            match result {
                Ok(()) => loaded += 1,
                Err(e) => warn!(provider = %entry.name, error = %e, "skipping provider record"),
            }
        }

        info!(loaded, total = self.providers.len(), "providers loaded from document");
        loaded
    }
}
