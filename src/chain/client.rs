//! Completion client for the hosted language model API

use crate::chain::error::{ChainError, ChainResult};
use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay between retry attempts for transient failures
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Trait for text-completion providers
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a completion for a fully rendered prompt
    async fn complete(&self, prompt: &str) -> ChainResult<String>;

    /// Get provider name
    fn name(&self) -> &str;
}

/// Groq provider implementation (OpenAI-compatible chat completions API)
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_seconds: u64,
    max_retries: u32,
}

impl GroqClient {
    pub fn new(config: &LlmConfig) -> ChainResult<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ChainError::Configuration(
                "Groq API key not configured. Set the GROQ_API_KEY environment variable or add api_key to the [llm] section of the config file.".to_string(),
            )
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ChainError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_seconds: config.timeout_seconds,
            max_retries: config.max_retries,
        })
    }

    async fn call_api(&self, prompt: &str) -> ChainResult<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!(
            "Calling Groq API with model: {}, max_tokens: {}, temperature: {}",
            self.model, self.max_tokens, self.temperature
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Timeout {
                        timeout_secs: self.timeout_seconds,
                    }
                } else {
                    ChainError::Network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChainError::Api {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let response_body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Generation(format!("Failed to parse API response: {e}")))?;

        let content = response_body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ChainError::Generation("Response contained no choices".to_string()))?;

        if content.trim().is_empty() {
            return Err(ChainError::EmptyCompletion);
        }

        Ok(content)
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, prompt: &str) -> ChainResult<String> {
        retry_transient(self.max_retries, RETRY_DELAY, || self.call_api(prompt)).await
    }

    fn name(&self) -> &str {
        "Groq"
    }
}

/// Drive `call` to completion, retrying transient failures with `delay`
/// between attempts. Non-retryable errors, and a transient error once
/// `max_retries` extra attempts are spent, propagate to the caller.
async fn retry_transient<F, Fut>(
    max_retries: u32,
    delay: Duration,
    mut call: F,
) -> ChainResult<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ChainResult<String>>,
{
    let mut attempt: u32 = 0;
    loop {
        match call().await {
            Ok(text) => return Ok(text),
            Err(err) if err.is_retryable() && attempt < max_retries => {
                attempt += 1;
                warn!(
                    "Completion attempt {attempt} failed ({err}), retrying after {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

// OpenAI-compatible chat completion types
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Create a completion client based on configuration
pub fn create_completion_client(config: &LlmConfig) -> ChainResult<Box<dyn CompletionClient>> {
    let client = GroqClient::new(config)?;
    Ok(Box::new(client))
}
