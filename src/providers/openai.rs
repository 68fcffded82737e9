use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::translation::prompts::Prompt;
use super::{ClientSettings, Provider, api_url, error_from_response, http_client};

/// OpenAI client for the Chat Completions API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: reqwest::Client,
    /// Chat completions endpoint URL
    url: url::Url,
    settings: ClientSettings,
}

/// OpenAI chat completion request
#[derive(Debug, Serialize, Default)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The conversation so far
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// A chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    #[serde(default)]
    pub content: Option<String>,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl OpenAIRequest {
    /// Create a new request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: Some(content.into()),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token limit
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(settings: ClientSettings) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(settings.timeout_secs)?,
            url: api_url(&settings.endpoint, "chat/completions")?,
            settings,
        })
    }

    /// Build the chat completion request for a prompt
    pub fn build_request(&self, prompt: &Prompt) -> OpenAIRequest {
        OpenAIRequest::new(&self.settings.model)
            .add_message("system", &prompt.system)
            .add_message("user", &prompt.user)
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
    }

    async fn send(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self.client.post(self.url.clone())
            .bearer_auth(&self.settings.api_key)
            .json(request)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(error_from_response(self.name(), response).await);
        }

        let openai_response = response.json::<OpenAIResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))?;

        if let Some(usage) = &openai_response.usage {
            debug!(
                "OpenAI usage: {} prompt tokens, {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(openai_response)
    }

    /// Extract text from the first choice
    pub fn extract_text(response: &OpenAIResponse) -> Result<String, ProviderError> {
        let choice = response.choices.first()
            .ok_or_else(|| ProviderError::ParseError("Response contained no choices".to_string()))?;
        if choice.finish_reason.as_deref() == Some("length") {
            log::warn!("OpenAI completion was cut off at the token limit");
        }
        Ok(choice.message.content.clone().unwrap_or_default())
    }
}

#[async_trait]
impl Provider for OpenAI {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let request = self.build_request(prompt);
        let response = self.send(&request).await?;
        Self::extract_text(&response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = OpenAIRequest::new(&self.settings.model)
            .add_message("user", "Hello")
            .max_tokens(5);
        self.send(&request).await.map(|_| ())
    }
}
