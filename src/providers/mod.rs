/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported LLM providers:
 * - OpenAI: Chat Completions API integration
 * - Anthropic: Messages API integration
 * - Mock: scripted responses for tests
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::fmt::Debug;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;
use crate::translation::prompts::Prompt;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the translation driver.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Short provider name used in log messages
    fn name(&self) -> &str;

    /// Complete a prompt using this provider
    ///
    /// # Arguments
    /// * `prompt` - The system instruction and user message to send
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The completion text or an error
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Build the provider selected in `config`
pub fn create_provider(config: &TranslationConfig) -> Result<Box<dyn Provider>> {
    let api_key = config.get_api_key();
    if api_key.is_empty() {
        return Err(anyhow!(
            "No API key configured for {}",
            config.provider.display_name()
        ));
    }

    let settings = ClientSettings {
        api_key,
        endpoint: config.get_endpoint(),
        model: config.get_model(),
        timeout_secs: config.get_timeout_secs(),
        max_tokens: config.get_max_tokens(),
        temperature: config.common.temperature,
    };

    Ok(match config.provider {
        TranslationProvider::OpenAI => Box::new(openai::OpenAI::new(settings)?),
        TranslationProvider::Anthropic => Box::new(anthropic::Anthropic::new(settings)?),
    })
}

/// Connection and sampling settings shared by the HTTP providers
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Join an endpoint base URL and a path, validating the result
pub(crate) fn api_url(endpoint: &str, path: &str) -> Result<url::Url> {
    let joined = format!("{}/{}", endpoint.trim_end_matches('/'), path.trim_start_matches('/'));
    url::Url::parse(&joined).map_err(|e| anyhow!("Invalid endpoint URL {}: {}", joined, e))
}

/// Build a reqwest client with the per-call timeout
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))
}

/// Turn a non-success response into a [`ProviderError`]
pub(crate) async fn error_from_response(provider: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    log::error!("{} API error ({}): {}", provider, status, body);
    ProviderError::from_status(status.as_u16(), body)
}

pub mod anthropic;
pub mod mock;
pub mod openai;
