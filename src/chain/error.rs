//! Error types for the prompt chain

use thiserror::Error;

/// Result type for prompt chain operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur while generating SQL or synthesizing an answer
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("completion provider error: {0}")]
    Generation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

impl ChainError {
    /// Check if the error is worth retrying. Only transient transport
    /// failures and server-side throttling qualify; configuration and
    /// provider errors are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChainError::Network(_) | ChainError::Timeout { .. } => true,
            ChainError::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            _ => false,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ChainError::Generation(msg) => format!("The language model request failed: {msg}"),
            ChainError::Configuration(msg) => {
                format!("Configuration issue: {msg}. Check your config file or environment variables.")
            }
            ChainError::Network(msg) => {
                format!("Network error: {msg}. Check your internet connection.")
            }
            ChainError::Api {
                status_code,
                message,
            } => format!("API error ({status_code}): {message}"),
            ChainError::Timeout { timeout_secs } => {
                format!("Request timed out after {timeout_secs} seconds. Try again or increase the timeout in config.")
            }
            ChainError::EmptyCompletion => {
                "The language model returned an empty response.".to_string()
            }
        }
    }
}
