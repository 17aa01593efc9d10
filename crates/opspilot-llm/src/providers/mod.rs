//! Provider clients
//!
//! Every backend implements [`CompletionClient`]: one system instruction plus
//! one user prompt in, plain model text out. Request and response shapes are
//! provider-native; error mapping is shared.

/// Anthropic Messages API client
pub mod anthropic;
/// OAuth-session backed Codex client
pub mod codex;
/// OpenAI Chat Completions client
pub mod openai;

mod http;

use crate::error::{Error, Result};
use crate::util::{mask_api_key, mask_optional};
use std::fmt;
use std::str::FromStr;

/// Largest slice of an upstream error body kept in [`Error::Api`]
pub const MAX_ERROR_BODY_BYTES: usize = 2048;

/// Supported model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI API key
    OpenAi,
    /// Anthropic API key
    Anthropic,
    /// ChatGPT OAuth session (Codex login)
    OpenAiCodex,
}

impl ProviderKind {
    /// Every supported backend
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Anthropic, Self::OpenAiCodex];

    /// Provider name as used in configuration and profiles
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::OpenAiCodex => "openai-codex",
        }
    }

    /// Environment variable overriding the credential
    #[must_use]
    pub fn token_env_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAiCodex => "OPENAI_CODEX_ACCESS_TOKEN",
        }
    }

    /// Output budget used when none is configured
    #[must_use]
    pub fn default_max_tokens(self) -> u32 {
        match self {
            Self::Anthropic => 4096,
            Self::OpenAi | Self::OpenAiCodex => 2048,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::UnknownProvider(s.to_string()))
    }
}

/// A single-shot completion request
#[derive(Clone, Default)]
pub struct CompletionRequest {
    /// Bearer token or API key
    pub api_key: String,
    /// Account the token belongs to, when known
    pub account_id: Option<String>,
    /// Model name
    pub model: String,
    /// Base URL override
    pub base_url: Option<String>,
    /// System instruction
    pub system: String,
    /// User prompt
    pub prompt: String,
    /// Output token cap
    pub max_tokens: u32,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for CompletionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionRequest")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("account_id", &mask_optional(self.account_id.as_deref()))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("system_len", &self.system.len())
            .field("prompt_len", &self.prompt.len())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl CompletionRequest {
    /// Reject a request missing its credential or model
    pub(crate) fn validate(&self, provider: ProviderKind) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::NotConfigured(format!("{provider}: credential is missing")));
        }
        if self.model.trim().is_empty() {
            return Err(Error::NotConfigured(format!("{provider}: model is missing")));
        }
        Ok(())
    }

    /// `{base}{path}` with the configured base or `default_base`
    pub(crate) fn endpoint(&self, default_base: &str, path: &str) -> String {
        let base = crate::util::non_blank(self.base_url.as_deref()).unwrap_or(default_base);
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

/// A model backend that turns a prompt into text
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one completion request and return the model's text
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" Anthropic ".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!(
            "openai-codex".parse::<ProviderKind>().unwrap(),
            ProviderKind::OpenAiCodex
        );
        assert!(matches!(
            "gemini".parse::<ProviderKind>(),
            Err(Error::UnknownProvider(name)) if name == "gemini"
        ));
    }

    #[test]
    fn test_default_max_tokens() {
        assert_eq!(ProviderKind::Anthropic.default_max_tokens(), 4096);
        assert_eq!(ProviderKind::OpenAi.default_max_tokens(), 2048);
        assert_eq!(ProviderKind::OpenAiCodex.default_max_tokens(), 2048);
    }

    #[test]
    fn test_validate_and_endpoint() {
        let mut request = CompletionRequest {
            api_key: "sk-test".to_string(),
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        assert!(request.validate(ProviderKind::OpenAi).is_ok());
        assert_eq!(
            request.endpoint("https://api.openai.com/v1", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );

        request.base_url = Some("http://localhost:9000/".to_string());
        assert_eq!(
            request.endpoint("https://api.openai.com/v1", "/chat/completions"),
            "http://localhost:9000/chat/completions"
        );

        request.model = " ".to_string();
        assert!(matches!(
            request.validate(ProviderKind::OpenAi),
            Err(Error::NotConfigured(_))
        ));

        request.model = "m".to_string();
        request.api_key = String::new();
        assert!(matches!(
            request.validate(ProviderKind::OpenAi),
            Err(Error::NotConfigured(_))
        ));
    }

    #[test]
    fn test_debug_masks_key() {
        let request = CompletionRequest {
            api_key: "sk-1234567890abcdefghij".to_string(),
            prompt: "hello".to_string(),
            ..Default::default()
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("1234567890"));
        assert!(!debug.contains("hello"));
    }

    #[test]
    fn test_dispatch_through_trait_object() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|req: &CompletionRequest| req.max_tokens == 64)
            .returning(|req| Ok(format!("echo: {}", req.prompt)));

        let client: std::sync::Arc<dyn CompletionClient> = std::sync::Arc::new(mock);
        let request = CompletionRequest {
            prompt: "ping".to_string(),
            max_tokens: 64,
            ..Default::default()
        };
        let text = tokio_test::block_on(client.complete(request)).unwrap();
        assert_eq!(text, "echo: ping");
    }
}
