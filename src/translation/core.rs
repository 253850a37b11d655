/*!
 * Core translation service implementation.
 *
 * `TranslationService` owns the provider and turns one batch of texts into one
 * batch of translations: it builds the numbered prompt, calls the provider
 * under the retry policy and parses the numbered answer.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::app_config::Config;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::anthropic::Anthropic;
use crate::providers::{CompletionRequest, Provider};
use super::parser::parse_numbered_response;
use super::prompts::{numbered_block, PromptTemplate};
use super::retry::{RetryDecision, RetryPolicy};

/// Token usage statistics for tracking API consumption
#[derive(Clone, Debug)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Number of provider requests, retries included
    pub requests: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl TokenUsageStats {
    pub fn new(model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            requests: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            model,
        }
    }

    /// Add token usage numbers reported by a provider
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "Token usage: model {} - {} requests - {} prompt + {} completion = {} tokens ({:.0} tokens/min)",
            self.model,
            self.requests,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.tokens_per_minute()
        )
    }
}

/// Options for customizing batch translation
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Prompt template with an `{input_text}` slot
    pub template: PromptTemplate,

    /// Source language name inserted into the template
    pub source_language: String,

    /// Target language name inserted into the template
    pub target_language: String,

    /// Maximum number of tokens the model may generate per batch
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Retry policy for rate limits and transient failures
    pub retry: RetryPolicy,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            template: PromptTemplate::default(),
            source_language: "Japanese".to_string(),
            target_language: "Simplified Chinese".to_string(),
            max_tokens: 4096,
            temperature: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Batch translation service backed by a language model provider
#[derive(Clone)]
pub struct TranslationService {
    provider: Arc<dyn Provider>,
    pub options: TranslationOptions,
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("provider", &self.provider)
            .field("options", &self.options)
            .finish()
    }
}

impl TranslationService {
    /// Create a service around any provider
    pub fn with_provider(provider: Arc<dyn Provider>, options: TranslationOptions) -> Self {
        Self { provider, options }
    }

    /// Create a service from configuration, using the Anthropic provider
    pub fn new(config: &Config) -> Result<Self, TranslationError> {
        let options = config.translation_options();
        let config = &config.translation;
        if config.api_key.is_empty() {
            return Err(TranslationError::Config(
                "Claude API key is required. Set it via CLAUDE_API_KEY environment variable.".to_string(),
            ));
        }

        let provider = Anthropic::new(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.model.clone(),
            config.timeout_secs,
        );

        Ok(Self::with_provider(Arc::new(provider), options))
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }

    /// Build the full prompt for one batch
    pub fn build_prompt<S: AsRef<str>>(&self, texts: &[S]) -> String {
        self.options.template.render(
            &numbered_block(texts),
            &self.options.source_language,
            &self.options.target_language,
        )
    }

    /// Translate one batch of texts, returning exactly one translation per
    /// text. Missing lines in the model answer become empty strings.
    pub async fn translate_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
        usage: &mut TokenUsageStats,
    ) -> Result<Vec<String>, TranslationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = self.build_prompt(texts);
        let policy = self.options.retry;
        let mut attempt: u32 = 0;

        loop {
            let mut request = CompletionRequest::new(prompt.clone(), self.options.max_tokens);
            request.temperature = self.options.temperature;

            let started = Instant::now();
            let result = self.provider.complete(request).await;
            usage.api_duration += started.elapsed();
            usage.requests += 1;

            let error = match result {
                Ok(response) => {
                    usage.add_token_usage(response.prompt_tokens, response.completion_tokens);
                    let translations = parse_numbered_response(&response.text, texts.len());
                    let missing = translations.iter().filter(|t| t.is_empty()).count();
                    if missing > 0 {
                        warn!("{} of {} lines missing from translation response", missing, texts.len());
                    }
                    return Ok(translations);
                }
                Err(e) => e,
            };

            match policy.decide(attempt, &error) {
                RetryDecision::Retry(delay) => {
                    warn!(
                        "Translation attempt {}/{} failed: {} - retrying in {:?}",
                        attempt + 1, policy.max_attempts, error, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::Exhausted => {
                    return Err(TranslationError::Exhausted {
                        attempts: attempt + 1,
                        source: error,
                    });
                }
                RetryDecision::Fatal => {
                    debug!("Translation attempt {} failed with non-retryable error", attempt + 1);
                    return Err(TranslationError::Fatal(error));
                }
            }
        }
    }
}
