/*!
 * Mock provider implementation for testing.
 *
 * The mock reads the batch back out of the prompt, so it can answer any
 * request without network access:
 * - `MockProvider::working()` - Always succeeds with prefixed source strings
 * - `MockProvider::failing()` - Always fails with a connection error
 * - `MockProvider::unauthorized()` - Always fails with an authentication error
 *
 * Scripted replies queued with [`MockProvider::push_reply`] take precedence
 * over the behavior, one per request.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::translation::prompts::{Prompt, TranslationRequest};

/// Behavior once the script is exhausted
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Translate every entry as `"<prefix><source>"`
    Working { prefix: String },
    /// Always fails with a transient connection error
    Failing,
    /// Always fails with an authentication error
    Unauthorized,
}

/// One scripted reply
#[derive(Debug)]
pub enum MockReply {
    /// Completion text returned verbatim
    Text(String),
    /// Error returned instead of a completion
    Error(ProviderError),
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Replies consumed before falling back to `behavior`
    script: Mutex<VecDeque<MockReply>>,
    /// Every prompt received, in order
    prompts: Mutex<Vec<Prompt>>,
    /// Request counter
    request_count: AtomicUsize,
    /// Artificial latency per request
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            request_count: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working { prefix: "[TRANSLATED] ".to_string() })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that rejects every request as unauthenticated
    pub fn unauthorized() -> Self {
        Self::new(MockBehavior::Unauthorized)
    }

    /// Add latency to every request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply for the next unanswered request
    pub fn push_reply(&self, reply: MockReply) {
        self.script.lock().push_back(reply);
    }

    /// Queue a completion text
    pub fn push_text(&self, text: impl Into<String>) {
        self.push_reply(MockReply::Text(text.into()));
    }

    /// Queue an error
    pub fn push_error(&self, error: ProviderError) {
        self.push_reply(MockReply::Error(error));
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every prompt received
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().clone()
    }

    /// Generate a JSON completion with `entries[i]` under index `i`
    pub fn json_response(entries: &[&str]) -> String {
        let object: BTreeMap<String, &str> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i.to_string(), *entry))
            .collect();
        serde_json::to_string(&object).unwrap_or_else(|_| "{}".to_string())
    }

    fn respond(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        match &self.behavior {
            MockBehavior::Working { prefix } => {
                let request = TranslationRequest::from_user_prompt(&prompt.user)
                    .ok_or_else(|| ProviderError::RequestFailed("Prompt carries no request".to_string()))?;
                let object: BTreeMap<String, String> = request
                    .entries_to_translate
                    .iter()
                    .map(|e| (e.index.to_string(), format!("{}{}", prefix, e.source)))
                    .collect();
                serde_json::to_string(&object).map_err(|e| ProviderError::ParseError(e.to_string()))
            }
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError("Invalid API key".to_string())),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(error)) => Err(error),
            None => self.respond(prompt),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Working { .. } => Ok(()),
            _ => self.respond(&Prompt { system: String::new(), user: String::new() }).map(|_| ()),
        }
    }
}
