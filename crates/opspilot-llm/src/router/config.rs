//! Router configuration

use crate::util::mask_optional;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Planning gateway configuration
///
/// Built once per process (normally from the `[llm]` config table) and
/// read-only afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Provider name: `openai`, `anthropic` or `openai-codex`
    pub provider: String,
    /// Model name
    pub model: String,
    /// Base URL override
    pub api_base: Option<String>,
    /// Credential that wins over every other source
    pub explicit_api_key: Option<String>,
    /// Output budget; 0 selects the provider default
    pub max_tokens: u32,
    /// Stored profile to use
    pub auth_profile_id: Option<String>,
    /// Profile store location
    pub auth_store_path: Option<PathBuf>,
    /// Patterns scrubbed from the assembled prompt
    pub redact_patterns: Vec<String>,
    /// Provider request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: String::new(),
            api_base: None,
            explicit_api_key: None,
            max_tokens: 0,
            auth_profile_id: None,
            auth_store_path: None,
            redact_patterns: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field(
                "explicit_api_key",
                &mask_optional(self.explicit_api_key.as_deref()),
            )
            .field("max_tokens", &self.max_tokens)
            .field("auth_profile_id", &self.auth_profile_id)
            .field("auth_store_path", &self.auth_store_path)
            .field("redact_patterns", &self.redact_patterns.len())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RouterConfig {
    /// Configuration for `provider` and `model`
    #[must_use]
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    /// Set an explicit credential
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.explicit_api_key = Some(key.into());
        self
    }

    /// Set the output budget
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Use a specific stored profile
    #[must_use]
    pub fn with_auth_profile(mut self, id: impl Into<String>) -> Self {
        self.auth_profile_id = Some(id.into());
        self
    }

    /// Read profiles from `path`
    #[must_use]
    pub fn with_auth_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth_store_path = Some(path.into());
        self
    }

    /// Scrub `patterns` from prompts
    #[must_use]
    pub fn with_redact_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redact_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_table() {
        let config: RouterConfig = serde_json::from_value(serde_json::json!({
            "provider": "anthropic",
            "model": "claude-sonnet-4-5-20250929",
            "redact_patterns": ["AKIA[0-9A-Z]{16}"]
        }))
        .unwrap();

        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.max_tokens, 0);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.redact_patterns.len(), 1);
        assert!(config.explicit_api_key.is_none());
    }

    #[test]
    fn test_debug_masks_key() {
        let config = RouterConfig::new("openai", "gpt-4o-mini").with_api_key("sk-1234567890abcdefghij");
        let debug = format!("{config:?}");
        assert!(!debug.contains("1234567890"));
        assert!(debug.contains("sk-1...ghij"));
    }
}
