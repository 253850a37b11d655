/*!
 * Mock provider implementation for testing.
 *
 * The provider plays back a script of outcomes, one per request. Once the
 * script is used up it falls back to echoing the numbered lines of the prompt
 * with a `[ZH]` prefix, so any batch gets a well-formed answer:
 * - `MockProvider::working()` - always echoes
 * - `MockProvider::scripted(..)` - plays the script, then echoes
 * - `MockProvider::failing()` - always fails with a fatal error
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::translation::parser::NUMBERED_LINE;
use super::{CompletionRequest, CompletionResponse, Provider};

/// One scripted reaction of the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockOutcome {
    /// Answer with the given text
    Respond(String),
    /// Echo the numbered prompt lines as "translations"
    Echo,
    /// Fail with HTTP 429
    RateLimited,
    /// Fail with HTTP 503
    Transient,
    /// Fail with HTTP 400
    Fatal,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<MockOutcome>>>,
    /// Outcome used once the script is exhausted
    fallback: MockOutcome,
    request_count: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a mock provider that plays `script` and then `fallback` forever
    pub fn new(script: Vec<MockOutcome>, fallback: MockOutcome) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback,
            request_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always echoes
    pub fn working() -> Self {
        Self::new(Vec::new(), MockOutcome::Echo)
    }

    /// Create a mock provider that plays `script` and then echoes
    pub fn scripted(script: Vec<MockOutcome>) -> Self {
        Self::new(script, MockOutcome::Echo)
    }

    /// Create a failing mock provider that always returns a fatal error
    pub fn failing() -> Self {
        Self::new(Vec::new(), MockOutcome::Fatal)
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Builds the echo answer for a prompt: every numbered line `n. text`
    /// becomes `n. [ZH] text`
    pub fn echo_response(prompt: &str) -> String {
        prompt
            .lines()
            .filter_map(|line| {
                NUMBERED_LINE.captures(line.trim()).map(|caps| {
                    format!("{}. [ZH] {}", &caps[1], caps[2].trim())
                })
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn next_outcome(&self) -> MockOutcome {
        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        match self.next_outcome() {
            MockOutcome::Respond(text) => Ok(CompletionResponse {
                text,
                prompt_tokens: Some(10),
                completion_tokens: Some(5),
            }),
            MockOutcome::Echo => Ok(CompletionResponse {
                text: Self::echo_response(&request.prompt),
                prompt_tokens: Some(10),
                completion_tokens: Some(5),
            }),
            MockOutcome::RateLimited => Err(ProviderError::RateLimitExceeded("Mock rate limit".to_string())),
            MockOutcome::Transient => Err(ProviderError::ApiError {
                status_code: 503,
                message: "Mock service unavailable".to_string(),
            }),
            MockOutcome::Fatal => Err(ProviderError::ApiError {
                status_code: 400,
                message: "Mock bad request".to_string(),
            }),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.fallback {
            MockOutcome::Fatal => Err(ProviderError::ConnectionError("Mock connection failure".to_string())),
            _ => Ok(()),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
