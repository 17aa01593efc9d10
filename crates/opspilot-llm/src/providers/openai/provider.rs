use super::types::{ChatMessage, ChatRequest, ChatResponse, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::providers::http::send_json;
use crate::providers::{CompletionClient, CompletionRequest, ProviderKind};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument};

/// OpenAI API-key client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
}

impl OpenAiClient {
    /// Create a client sharing `client`'s connection pool
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiClient {
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        request.validate(ProviderKind::OpenAi)?;
        let url = request.endpoint(DEFAULT_BASE_URL, "/chat/completions");
        chat_completion(&self.client, &url, &request, ProviderKind::OpenAi, |b| b).await
    }
}

/// Issue one Chat Completions call.
///
/// `decorate` adds provider-specific headers on top of bearer auth.
pub(crate) async fn chat_completion(
    client: &Client,
    url: &str,
    request: &CompletionRequest,
    provider: ProviderKind,
    decorate: impl FnOnce(RequestBuilder) -> RequestBuilder,
) -> Result<String> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = crate::util::non_blank(Some(request.system.as_str())) {
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &request.prompt,
    });

    let body = ChatRequest {
        model: &request.model,
        messages,
        max_tokens: request.max_tokens,
    };

    debug!(provider = %provider, "Sending request: {}", url);

    let http = decorate(client.post(url).bearer_auth(&request.api_key).json(&body));
    let response: ChatResponse = send_json(http, provider.as_str()).await?;

    response
        .into_text()
        .ok_or_else(|| Error::EmptyResponse(provider.to_string()))
}
