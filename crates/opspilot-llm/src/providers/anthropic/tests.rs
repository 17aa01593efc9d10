use super::*;
use crate::error::Error;
use crate::providers::{CompletionClient, CompletionRequest, MAX_ERROR_BODY_BYTES};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(server: &MockServer) -> CompletionRequest {
    CompletionRequest {
        api_key: "sk-ant-test-key".to_string(),
        account_id: None,
        model: "claude-sonnet-4-5-20250929".to_string(),
        base_url: Some(server.uri()),
        system: "You are an operations planner.".to_string(),
        prompt: "Restart the payment-api deployment".to_string(),
        max_tokens: 4096,
    }
}

#[tokio::test]
async fn test_complete_sends_messages_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test-key"))
        .and(header("anthropic-version", API_VERSION))
        .and(body_partial_json(json!({
            "model": "claude-sonnet-4-5-20250929",
            "max_tokens": 4096,
            "system": "You are an operations planner.",
            "messages": [{"role": "user", "content": "Restart the payment-api deployment"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "model": "claude-sonnet-4-5-20250929",
            "content": [
                {"type": "text", "text": "{\"summary\":"},
                {"type": "text", "text": "\"restart\"}"}
            ],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicClient::new(reqwest::Client::new());
    let text = client.complete(request(&server)).await.unwrap();
    assert_eq!(text, "{\"summary\":\"restart\"}");
}

#[tokio::test]
async fn test_non_2xx_carries_status_and_truncated_body() {
    let server = MockServer::start().await;
    let long_body = "x".repeat(MAX_ERROR_BODY_BYTES * 2);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string(long_body))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(reqwest::Client::new());
    match client.complete(request(&server)).await {
        Err(Error::Api { status, body }) => {
            assert_eq!(status, 529);
            assert_eq!(body.len(), MAX_ERROR_BODY_BYTES);
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_content_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "tool_use", "id": "t", "name": "n", "input": {}}]
        })))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(reqwest::Client::new());
    assert!(matches!(
        client.complete(request(&server)).await,
        Err(Error::EmptyResponse(_))
    ));
}

#[tokio::test]
async fn test_missing_model_fails_before_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut req = request(&server);
    req.model = String::new();

    let client = AnthropicClient::new(reqwest::Client::new());
    assert!(matches!(
        client.complete(req).await,
        Err(Error::NotConfigured(_))
    ));
}

#[test]
fn test_response_text_skips_other_blocks() {
    let response: types::MessagesResponse = serde_json::from_value(json!({
        "content": [
            {"type": "thinking", "thinking": "..."},
            {"type": "text", "text": "plan"}
        ]
    }))
    .unwrap();
    assert_eq!(response.text(), "plan");
}
