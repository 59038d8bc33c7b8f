//! Provider routing for switchboard.
//!
//! This crate provides:
//! - A uniform, capability-gated [`Provider`] trait over AI backends
//! - A [`ProviderRegistry`] of named provider instances and their factories
//! - A [`ProviderManager`] that adds fallback, load balancing, and usage stats
//! - A TOML [`config`] document for declaring providers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  ProviderManager                     │
//! │   fallback · load balancing · compare · batch       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                  ProviderRegistry                    │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  │
//! │  │   Ollama    │  │    Mock     │  │   custom    │  │
//! │  │  Provider   │  │  Provider   │  │  factories  │  │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use switchboard_providers::config::{register_builtin_factories, ProvidersDocument};
//! use switchboard_providers::providers::QueryOptions;
//! use switchboard_providers::{ProviderManager, ProviderRegistry};
//!
//! let registry = Arc::new(ProviderRegistry::new());
//! register_builtin_factories(&registry)?;
//! let manager = ProviderManager::new(Arc::clone(&registry));
//! ProvidersDocument::default_document().apply(&registry, &manager);
//!
//! let answer = manager
//!     .query_with_fallback("Why is the sky blue?", None, None, QueryOptions::new())
//!     .await;
//! ```

mod error;
mod types;

pub mod auth;
pub mod config;
pub mod manager;
pub mod providers;
pub mod registry;

pub use error::{Error, Result};
pub use manager::{ProviderManager, UsageStats};
pub use providers::{MockProvider, OllamaProvider, Provider, ProviderConfig};
pub use registry::{ProviderFactory, ProviderRegistry};
pub use types::{ContentRating, ModelCapability, ModelInfo, ModelInfoBuilder, ModerationResult};
