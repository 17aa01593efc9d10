use super::types::{MessageParam, MessagesRequest, MessagesResponse, API_VERSION, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::providers::http::send_json;
use crate::providers::{CompletionClient, CompletionRequest, ProviderKind};
use reqwest::Client;
use tracing::{debug, instrument};

/// Anthropic Claude client
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
}

impl AnthropicClient {
    /// Create a client sharing `client`'s connection pool
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CompletionClient for AnthropicClient {
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        request.validate(ProviderKind::Anthropic)?;

        let url = request.endpoint(DEFAULT_BASE_URL, "/v1/messages");
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: crate::util::non_blank(Some(request.system.as_str())),
            messages: vec![MessageParam {
                role: "user",
                content: &request.prompt,
            }],
        };

        debug!("Sending request to Anthropic: {}", url);

        let http = self
            .client
            .post(&url)
            .header("x-api-key", &request.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let response: MessagesResponse = send_json(http, ProviderKind::Anthropic.as_str()).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(Error::EmptyResponse(ProviderKind::Anthropic.to_string()));
        }
        Ok(text)
    }
}
