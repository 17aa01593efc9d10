//! Codex - ChatGPT OAuth session client
//!
//! Uses the access token from a Codex CLI login rather than an API key. The
//! request body is the Chat Completions format; the account the session
//! belongs to is sent in `chatgpt-account-id` when known.

use super::openai::provider::chat_completion;
use super::{CompletionClient, CompletionRequest, ProviderKind};
use crate::error::Result;
use reqwest::Client;
use tracing::instrument;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://chatgpt.com/backend-api/codex";

/// Header carrying the ChatGPT account id
pub const ACCOUNT_HEADER: &str = "chatgpt-account-id";

/// OAuth-session backed client
#[derive(Debug, Clone)]
pub struct CodexClient {
    client: Client,
}

impl CodexClient {
    /// Create a client sharing `client`'s connection pool
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CompletionClient for CodexClient {
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        request.validate(ProviderKind::OpenAiCodex)?;
        let url = request.endpoint(DEFAULT_BASE_URL, "/chat/completions");
        let account_id = crate::util::non_blank(request.account_id.as_deref()).map(str::to_string);

        chat_completion(
            &self.client,
            &url,
            &request,
            ProviderKind::OpenAiCodex,
            |builder| match account_id {
                Some(id) => builder.header(ACCOUNT_HEADER, id),
                None => builder,
            },
        )
        .await
    }
}
