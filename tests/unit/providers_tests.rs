/*!
 * Tests for provider construction, request payloads and the mock provider
 */

use std::sync::Arc;

use serde_json::json;
use ts_translator::app_config::{Config, TranslationProvider};
use ts_translator::errors::ProviderError;
use ts_translator::providers::anthropic::{Anthropic, AnthropicRequest, AnthropicResponse};
use ts_translator::providers::mock::MockProvider;
use ts_translator::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};
use ts_translator::providers::{ClientSettings, Provider, create_provider};
use ts_translator::translation::prompts::{Prompt, TranslationRequest};

fn settings(endpoint: &str) -> ClientSettings {
    ClientSettings {
        api_key: "secret".to_string(),
        endpoint: endpoint.to_string(),
        model: "model-x".to_string(),
        timeout_secs: 30,
        max_tokens: 2048,
        temperature: 0.2,
    }
}

fn prompt() -> Prompt {
    Prompt {
        system: "You translate UI strings.".to_string(),
        user: "Translate.\n\n{\"task\":\"translate_ui_strings\",\"source_language\":\"en_US\",\"target_language\":\"fr_FR\",\"entries_to_translate\":[{\"index\":0,\"source\":\"Open\",\"context\":\"Menu\"}]}".to_string(),
    }
}

#[test]
fn test_openai_build_request_shouldCarrySystemAndUserMessages() {
    let client = OpenAI::new(settings("https://api.openai.com/v1")).unwrap();
    let value = serde_json::to_value(client.build_request(&prompt())).unwrap();

    assert_eq!(value["model"], "model-x");
    assert_eq!(value["messages"][0]["role"], "system");
    assert_eq!(value["messages"][1]["role"], "user");
    assert_eq!(value["max_tokens"], 2048);
    assert!(value["messages"][1]["content"].as_str().unwrap().contains("\"Open\""));
}

#[test]
fn test_openai_request_builder_withoutOptions_shouldOmitThem() {
    let value = serde_json::to_value(OpenAIRequest::new("gpt").add_message("user", "hi")).unwrap();
    assert_eq!(value, json!({ "model": "gpt", "messages": [{ "role": "user", "content": "hi" }] }));
}

#[test]
fn test_openai_extract_text_withResponses_shouldHandleEdgeCases() {
    let response: OpenAIResponse = serde_json::from_value(json!({
        "choices": [{ "message": { "role": "assistant", "content": "{\"0\":\"Ouvrir\"}" }, "finish_reason": "stop" }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14 }
    }))
    .unwrap();
    assert_eq!(OpenAI::extract_text(&response).unwrap(), "{\"0\":\"Ouvrir\"}");

    let empty: OpenAIResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
    assert!(matches!(OpenAI::extract_text(&empty), Err(ProviderError::ParseError(_))));
}

#[test]
fn test_anthropic_build_request_shouldUseSystemField() {
    let client = Anthropic::new(settings("https://api.anthropic.com")).unwrap();
    let value = serde_json::to_value(client.build_request(&prompt())).unwrap();

    assert_eq!(value["system"], "You translate UI strings.");
    assert_eq!(value["messages"].as_array().unwrap().len(), 1);
    assert_eq!(value["messages"][0]["role"], "user");
    assert_eq!(value["max_tokens"], 2048);

    let bare = serde_json::to_value(AnthropicRequest::new("claude", 100).add_message("user", "hi")).unwrap();
    assert!(bare.get("system").is_none());
    assert!(bare.get("temperature").is_none());
}

#[test]
fn test_anthropic_extract_text_shouldJoinTextBlocks() {
    let response: AnthropicResponse = serde_json::from_value(json!({
        "content": [
            { "type": "text", "text": "{\"0\":" },
            { "type": "text", "text": "\"Ouvrir\"}" }
        ],
        "usage": { "input_tokens": 12, "output_tokens": 5 }
    }))
    .unwrap();
    assert_eq!(Anthropic::extract_text(&response), "{\"0\":\"Ouvrir\"}");
}

#[test]
fn test_create_provider_shouldFollowConfiguredProvider() {
    let mut config = Config::default();
    assert!(create_provider(&config.translation).is_err());

    config.translation.active_provider_config_mut().api_key = "sk-test".to_string();
    assert_eq!(create_provider(&config.translation).unwrap().name(), "OpenAI");

    config.translation.provider = TranslationProvider::Anthropic;
    config.translation.active_provider_config_mut().api_key = "sk-ant".to_string();
    assert_eq!(create_provider(&config.translation).unwrap().name(), "Anthropic");

    config.translation.active_provider_config_mut().endpoint = "not a url".to_string();
    assert!(create_provider(&config.translation).is_err());
}

#[tokio::test]
async fn test_mock_provider_working_shouldEchoRequestEntries() {
    let mock = MockProvider::working();
    let completion = mock.complete(&prompt()).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&completion).unwrap();

    assert_eq!(value, json!({ "0": "[TRANSLATED] Open" }));
    assert_eq!(mock.request_count(), 1);
    assert_eq!(mock.prompts()[0].system, "You translate UI strings.");
    assert!(TranslationRequest::from_user_prompt(&mock.prompts()[0].user).is_some());
}

#[tokio::test]
async fn test_mock_provider_test_connection_shouldFollowBehavior() {
    let working: Arc<dyn Provider> = Arc::new(MockProvider::working());
    let failing: Arc<dyn Provider> = Arc::new(MockProvider::failing());

    assert!(working.test_connection().await.is_ok());
    assert!(failing.test_connection().await.is_err());
    assert_eq!(failing.name(), "Mock");
}

#[tokio::test]
async fn test_mock_provider_unauthorized_shouldNotBeTransient() {
    let mock = MockProvider::unauthorized();
    let error = mock.complete(&prompt()).await.unwrap_err();
    assert!(matches!(error, ProviderError::AuthenticationError(_)));
    assert!(!error.is_transient());
}

#[test]
fn test_provider_error_from_status_shouldClassify() {
    assert!(matches!(ProviderError::from_status(401, "bad key".to_string()), ProviderError::AuthenticationError(_)));
    assert!(matches!(ProviderError::from_status(429, "slow down".to_string()), ProviderError::RateLimitExceeded(_)));
    assert!(ProviderError::from_status(503, "busy".to_string()).is_transient());
    assert!(!ProviderError::from_status(400, "bad request".to_string()).is_transient());
}
