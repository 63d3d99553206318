//! Gateway routing tests against mocked provider endpoints.

use mockito::Matcher;
use plume_abstraction::{ModelError, Provider};
use plume_models::{
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_GOOGLE_MODEL, Generation, ImageInput, LanguageGateway,
    ProviderCredential, ProviderCredentials, ProviderGateway, ProviderSpec,
};
use serde_json::json;

fn openai_body(content: &str) -> String {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
    })
    .to_string()
}

fn gemini_body(content: &str) -> String {
    json!({
        "candidates": [{"content": {"parts": [{"text": content}], "role": "model"}}],
        "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6}
    })
    .to_string()
}

fn claude_body(content: &str) -> String {
    json!({
        "content": [{"type": "text", "text": content}],
        "usage": {"input_tokens": 4, "output_tokens": 2}
    })
    .to_string()
}

#[tokio::test]
async fn test_openai_primary_serves_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "Be upbeat."},
                {"role": "user", "content": "Write about tea"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(openai_body("Tea time!"))
        .create_async()
        .await;

    let credentials = ProviderCredentials {
        openai: Some(ProviderCredential::new("sk-test").with_base_url(server.url())),
        ..ProviderCredentials::default()
    };
    let gateway = ProviderGateway::new(credentials);

    let outcome = gateway
        .generate_text("Write about tea", "Be upbeat.", &ProviderSpec::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        outcome,
        Generation::Generated {
            content: "Tea time!".to_string(),
            provider: Provider::OpenAI,
            model: "gpt-4o".to_string(),
        }
    );
}

#[tokio::test]
async fn test_missing_openai_falls_back_to_google() {
    let mut server = mockito::Server::new_async().await;
    let path = format!("/models/{DEFAULT_GOOGLE_MODEL}:generateContent");
    let mock = server
        .mock("POST", path.as_str())
        .match_header("x-goog-api-key", "g-key")
        .match_body(Matcher::PartialJson(json!({
            "systemInstruction": {"parts": [{"text": "Be upbeat."}]}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body("Gemini says hi"))
        .create_async()
        .await;

    let credentials = ProviderCredentials {
        google: Some(ProviderCredential::new("g-key").with_base_url(server.url())),
        anthropic: Some(ProviderCredential::new("a-key").with_base_url(server.url())),
        ..ProviderCredentials::default()
    };
    let gateway = ProviderGateway::new(credentials);

    let outcome = gateway
        .generate_text("hello", "Be upbeat.", &ProviderSpec::new("openai", "gpt-4o"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.provider(), Some(Provider::Google));
    assert_eq!(outcome.text(), "Gemini says hi");
}

#[tokio::test]
async fn test_anthropic_fallback_caps_tokens() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/messages")
        .match_header("x-api-key", "a-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(Matcher::PartialJson(json!({
            "model": DEFAULT_ANTHROPIC_MODEL,
            "max_tokens": 1024,
            "system": "sys"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(claude_body("Claude here"))
        .create_async()
        .await;

    let credentials = ProviderCredentials {
        anthropic: Some(ProviderCredential::new("a-key").with_base_url(server.url())),
        ..ProviderCredentials::default()
    };
    let gateway = ProviderGateway::new(credentials);

    let outcome = gateway.generate_text("hi", "sys", &ProviderSpec::default()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.provider(), Some(Provider::Anthropic));
    assert_eq!(outcome.text(), "Claude here");
}

#[tokio::test]
async fn test_configured_provider_failure_is_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let credentials = ProviderCredentials {
        openai: Some(ProviderCredential::new("sk-test").with_base_url(server.url())),
        google: Some(ProviderCredential::new("g-key").with_base_url(server.url())),
        ..ProviderCredentials::default()
    };
    let gateway = ProviderGateway::new(credentials);

    let err = gateway.generate_text("hi", "sys", &ProviderSpec::default()).await.unwrap_err();

    assert_eq!(err.provider, Provider::OpenAI);
    assert_eq!(err.model, "gpt-4o");
    assert!(matches!(err.source, ModelError::ModelResponseError(_)));
}

#[tokio::test]
async fn test_rate_limit_maps_to_quota_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"slow down"}}"#)
        .create_async()
        .await;

    let credentials = ProviderCredentials {
        openai: Some(ProviderCredential::new("sk-test").with_base_url(server.url())),
        ..ProviderCredentials::default()
    };
    let err = ProviderGateway::new(credentials)
        .generate_text("hi", "sys", &ProviderSpec::default())
        .await
        .unwrap_err();

    assert!(matches!(err.source, ModelError::QuotaExceeded { .. }));
}

#[tokio::test]
async fn test_image_goes_to_openai_with_vision_budget() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "max_tokens": 500,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "Describe this"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,QUJD"}}
                ]
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(openai_body("A small square."))
        .create_async()
        .await;

    let credentials = ProviderCredentials {
        openai: Some(ProviderCredential::new("sk-test").with_base_url(server.url())),
        ..ProviderCredentials::default()
    };
    let image = ImageInput::parse("data:image/png;base64,QUJD").unwrap();
    let outcome =
        ProviderGateway::new(credentials).analyze_image(&image, "Describe this").await.unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.text(), "A small square.");
}

#[tokio::test]
async fn test_image_skips_anthropic_for_unsupported_format() {
    let server = mockito::Server::new_async().await;
    let credentials = ProviderCredentials {
        anthropic: Some(ProviderCredential::new("a-key").with_base_url(server.url())),
        ..ProviderCredentials::default()
    };
    let image = ImageInput::from_bytes(b"BM....", "image/bmp");

    let outcome =
        ProviderGateway::new(credentials).analyze_image(&image, "Describe").await.unwrap();

    assert!(!outcome.is_generated());
    assert_eq!(outcome.text(), "Image format not supported by any configured vision provider.");
}

#[tokio::test]
async fn test_image_falls_back_to_gemini_inline() {
    let mut server = mockito::Server::new_async().await;
    let path = format!("/models/{DEFAULT_GOOGLE_MODEL}:generateContent");
    let mock = server
        .mock("POST", path.as_str())
        .match_body(Matcher::PartialJson(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": "Describe"},
                    {"inline_data": {"mime_type": "image/webp", "data": "QUJD"}}
                ]
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body("A sunset."))
        .create_async()
        .await;

    let credentials = ProviderCredentials {
        google: Some(ProviderCredential::new("g-key").with_base_url(server.url())),
        ..ProviderCredentials::default()
    };
    let image = ImageInput::parse("data:image/webp;base64,QUJD").unwrap();
    let outcome =
        ProviderGateway::new(credentials).analyze_image(&image, "Describe").await.unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.provider(), Some(Provider::Google));
    assert_eq!(outcome.text(), "A sunset.");
}
