//! Integration tests for the planning gateway
//!
//! These tests drive the library the way the CLI does:
//! - credential import into a profile store on disk
//! - resolution from the store
//! - the full plan pipeline against a mock provider endpoint

use chrono::{TimeZone, Utc};
use opspilot_llm::env::{FixedClock, StaticEnv};
use opspilot_llm::{
    AuthEnv, CredentialResolver, CredentialSource, Error, NativeImporter, ProfileStore, Router,
    RouterConfig, TolerantImporter,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn isolated_env() -> AuthEnv {
    AuthEnv::system()
        .with_env(StaticEnv::new())
        .with_clock(FixedClock(Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).unwrap()))
}

// ============================================================================
// Import → store → resolve
// ============================================================================

#[test]
fn test_native_import_then_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("auth.json");
    std::fs::write(
        &session,
        json!({
            "OPENAI_API_KEY": null,
            "tokens": {
                "access_token": "session-abc",
                "refresh_token": "rt-abc",
                "account_id": "acct-42"
            },
            "expires_at": 4102444800i64
        })
        .to_string(),
    )
    .unwrap();

    let profile = NativeImporter::new(isolated_env())
        .import(Some(session.as_path()))
        .unwrap();
    assert_eq!(profile.id, "openai-codex:acct-42");

    let store_path = dir.path().join("store").join("auth-profiles.json");
    let store = ProfileStore::open(&store_path);
    store
        .update(|profiles| {
            profiles.set_default("openai-codex", profile.id.clone());
            profiles.upsert(profile)
        })
        .unwrap();

    let config = RouterConfig::new("openai-codex", "gpt-5-codex").with_auth_store(&store_path);
    let resolved = CredentialResolver::new(isolated_env())
        .resolve(&config)
        .unwrap();

    assert_eq!(resolved.token, "session-abc");
    assert_eq!(resolved.account_id.as_deref(), Some("acct-42"));
    assert!(matches!(resolved.source, CredentialSource::Profile(id) if id == "openai-codex:acct-42"));
}

#[test]
fn test_tolerant_import_of_expired_credential() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("auth-profiles.json");
    std::fs::write(
        &export,
        json!({
            "anthropic:work": {"access": "old-token", "expires": 1700000000}
        })
        .to_string(),
    )
    .unwrap();

    let err = TolerantImporter::new(isolated_env())
        .import(Some(export.as_path()), "anthropic", None)
        .unwrap_err();
    assert!(matches!(err, Error::TokenExpired { .. }));
}

// ============================================================================
// Full pipeline
// ============================================================================

#[tokio::test]
async fn test_plan_against_mock_anthropic() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_string_contains("checkout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "{\"summary\":\"scale checkout\"}"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = StaticEnv::new().with_var("ANTHROPIC_API_KEY", "sk-ant-test");
    let config = RouterConfig::new("anthropic", "claude-sonnet-4-5-20250929")
        .with_api_base(server.uri());
    let router = Router::new(config).with_auth_env(isolated_env().with_env(env));

    let text = router
        .plan(
            "Scale checkout before the sale",
            &json!({"deployment": "checkout", "replicas": 3}),
            &json!([{"metric": "p99_latency_ms", "value": 840}]),
        )
        .await
        .unwrap();

    assert_eq!(text, "{\"summary\":\"scale checkout\"}");
}

#[tokio::test]
async fn test_provider_error_surfaces_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let config = RouterConfig::new("openai", "gpt-4o-mini")
        .with_api_key("sk-test")
        .with_api_base(server.uri());
    let router = Router::new(config).with_auth_env(isolated_env());

    let err = router
        .plan("restart api", &json!({}), &json!({}))
        .await
        .unwrap_err();

    match err {
        Error::Api { status, body, .. } => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
