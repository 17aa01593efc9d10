//! Plan router implementation

use super::config::RouterConfig;
use super::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::auth::CredentialResolver;
use crate::env::AuthEnv;
use crate::error::{Error, Result};
use crate::providers::anthropic::AnthropicClient;
use crate::providers::codex::CodexClient;
use crate::providers::openai::OpenAiClient;
use crate::providers::{CompletionClient, CompletionRequest, ProviderKind};
use crate::redact::Redactor;
use crate::sanitize::{sanitize, sanitize_value};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Turns an operator intent plus context and evidence into model text
pub struct Router {
    config: RouterConfig,
    redactor: Redactor,
    resolver: CredentialResolver,
    http: OnceLock<reqwest::Client>,
    clients: HashMap<ProviderKind, Arc<dyn CompletionClient>>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("redact_patterns", &self.redactor.len())
            .field("client_overrides", &self.clients.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Create a router using the real process environment
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        let redactor = Redactor::new(&config.redact_patterns);
        Self {
            config,
            redactor,
            resolver: CredentialResolver::default(),
            http: OnceLock::new(),
            clients: HashMap::new(),
        }
    }

    /// Resolve credentials against `auth_env` instead of the process
    #[must_use]
    pub fn with_auth_env(mut self, auth_env: AuthEnv) -> Self {
        self.resolver = CredentialResolver::new(auth_env);
        self
    }

    /// Use `client` for `provider` instead of the built-in one
    #[must_use]
    pub fn with_client(mut self, provider: ProviderKind, client: Arc<dyn CompletionClient>) -> Self {
        self.clients.insert(provider, client);
        self
    }

    /// Share an existing HTTP client
    #[must_use]
    pub fn with_http_client(self, client: reqwest::Client) -> Self {
        // freshly built router: the cell is empty
        let _ = self.http.set(client);
        self
    }

    /// The configuration this router was built with
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Produce plan text for `intent`.
    ///
    /// `context` and `evidence` are untrusted: their string content is
    /// sanitized and they are fenced as data inside the prompt.
    #[instrument(skip(self, intent, context, evidence), fields(provider = %self.config.provider, model = %self.config.model))]
    pub async fn plan<C, E>(&self, intent: &str, context: &C, evidence: &E) -> Result<String>
    where
        C: Serialize + ?Sized,
        E: Serialize + ?Sized,
    {
        let (provider, request) = self.prepare(intent, context, evidence)?;
        let client = self.client_for(provider)?;
        client.complete(request).await
    }

    /// [`Router::plan`], aborted with [`Error::Cancelled`] when `cancel` fires
    pub async fn plan_with_cancel<C, E>(
        &self,
        intent: &str,
        context: &C,
        evidence: &E,
        cancel: &CancellationToken,
    ) -> Result<String>
    where
        C: Serialize + ?Sized,
        E: Serialize + ?Sized,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(provider = %self.config.provider, "plan request cancelled");
                Err(Error::Cancelled)
            }
            r = self.plan(intent, context, evidence) => r,
        }
    }

    /// Everything up to the provider call
    fn prepare<C, E>(
        &self,
        intent: &str,
        context: &C,
        evidence: &E,
    ) -> Result<(ProviderKind, CompletionRequest)>
    where
        C: Serialize + ?Sized,
        E: Serialize + ?Sized,
    {
        // blank is judged after control characters are stripped
        let intent = sanitize(intent);
        let intent = intent.trim();
        if intent.is_empty() {
            return Err(Error::InvalidInput("intent is required".to_string()));
        }

        let context = encode("context", context)?;
        let evidence = encode("evidence", evidence)?;

        let mut prompt = build_user_prompt(intent, &context, &evidence);
        if !self.redactor.is_empty() {
            prompt = self.redactor.redact(&prompt);
        }

        let provider: ProviderKind = self.config.provider.parse()?;
        let max_tokens = if self.config.max_tokens > 0 {
            self.config.max_tokens
        } else {
            provider.default_max_tokens()
        };

        let credential = self.resolver.resolve_for(provider, &self.config)?;

        info!(
            provider = %provider,
            model = %self.config.model,
            max_tokens,
            credential = %credential.source,
            prompt_bytes = prompt.len(),
            "dispatching plan request"
        );

        Ok((
            provider,
            CompletionRequest {
                api_key: credential.token,
                account_id: credential.account_id,
                model: self.config.model.clone(),
                base_url: self.config.api_base.clone(),
                system: SYSTEM_PROMPT.to_string(),
                prompt,
                max_tokens,
            },
        ))
    }

    fn client_for(&self, provider: ProviderKind) -> Result<Arc<dyn CompletionClient>> {
        if let Some(client) = self.clients.get(&provider) {
            return Ok(Arc::clone(client));
        }

        let http = self.http_client()?;
        Ok(match provider {
            ProviderKind::OpenAi => Arc::new(OpenAiClient::new(http)),
            ProviderKind::Anthropic => Arc::new(AnthropicClient::new(http)),
            ProviderKind::OpenAiCodex => Arc::new(CodexClient::new(http)),
        })
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        if let Some(client) = self.http.get() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(self.http.get_or_init(|| client).clone())
    }
}

/// Sanitize string content, then JSON-encode
fn encode<T: Serialize + ?Sized>(what: &str, value: &T) -> Result<String> {
    let value = serde_json::to_value(value)
        .map_err(|e| Error::Encoding(format!("failed to encode {what}: {e}")))?;
    serde_json::to_string_pretty(&sanitize_value(&value))
        .map_err(|e| Error::Encoding(format!("failed to encode {what}: {e}")))
}
