//! Provider credentials.
//!
//! Credentials arrive either inline or as the name of an environment variable.
//! Where they are sourced from is the caller's business; this module only holds
//! the secret and resolves the two forms into one value.
//!
//! # Example
//!
//! ```
//! use switchboard_providers::auth::resolve_credential;
//!
//! let key = resolve_credential(None, Some("MY_KEY"), |name| {
//!     (name == "MY_KEY").then(|| "sk-test".to_string())
//! });
//! assert_eq!(key.unwrap().expose_secret(), "sk-test");
//! ```

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

/// Provider credential.
///
/// Held as a [`SecretString`] so it is zeroized on drop and never shows up in
/// `Debug` output or tracing fields. Reading it requires
/// [`expose_secret`](ApiKey::expose_secret), which only the HTTP layer calls.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Raw key text, for building an auth header.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiKey").field(&"<redacted>").finish()
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(SecretString::from(key))
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Resolve a credential from an inline value or an environment variable name.
///
/// The inline value wins. Empty strings count as absent in both forms.
pub fn resolve_credential<F>(
    inline: Option<&str>,
    env_var: Option<&str>,
    lookup: F,
) -> Option<ApiKey>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = inline.filter(|k| !k.is_empty()) {
        return Some(ApiKey::new(key));
    }

    let var = env_var.filter(|v| !v.is_empty())?;
    match lookup(var).filter(|k| !k.is_empty()) {
        Some(key) => {
            debug!(env_var = var, "resolved credential from environment");
            Some(ApiKey::new(key))
        }
        None => {
            debug!(env_var = var, "credential environment variable not set");
            None
        }
    }
}

/// Environment lookup backed by the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn debug_never_prints_the_key() {
        let key = ApiKey::new("sk-secret-12345");
        let rendered = format!("{key:?}");
        assert_eq!(rendered, "ApiKey(\"<redacted>\")");
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn api_key_expose_returns_value() {
        let key = ApiKey::from("sk-test");
        assert_eq!(key.expose_secret(), "sk-test");
    }

    #[test]
    fn inline_credential_wins_over_env() {
        let key = resolve_credential(Some("inline"), Some("VAR"), |_| Some("env".into()));
        assert_eq!(key.unwrap().expose_secret(), "inline");
    }

    #[test]
    fn env_credential_used_when_no_inline() {
        let key = resolve_credential(None, Some("VAR"), |name| {
            assert_eq!(name, "VAR");
            Some("from-env".into())
        });
        assert_eq!(key.unwrap().expose_secret(), "from-env");
    }

    #[test]
    fn empty_values_count_as_absent() {
        assert!(resolve_credential(Some(""), None, no_env).is_none());
        assert!(resolve_credential(None, Some(""), no_env).is_none());
        assert!(resolve_credential(None, Some("VAR"), |_| Some(String::new())).is_none());
    }

    #[test]
    fn missing_env_var_yields_none() {
        assert!(resolve_credential(None, Some("UNSET"), no_env).is_none());
    }
}
