//! ============================================================================
//! Completion Module - Chat completions from the hosted model
//! ============================================================================
//! One HTTP call per attempt against an OpenAI-compatible
//! `/chat/completions` endpoint. Timeouts are retried with a fixed delay up to
//! the configured number of attempts; every other failure is returned at once.
//!
//! ## Architecture
//! ```text
//! Vec<ChatMessage> → CompletionClient::complete
//!                        ↓
//!               retry_on_timeout(policy, attempt)
//!                        ↓
//!                POST {api_base}/chat/completions → raw JSON body
//! ```
//! ============================================================================

mod client;
mod retry;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{ChatMessage, CompletionError};

pub use client::CompletionClient;
pub use retry::{retry_on_timeout, AttemptError, RetryPolicy};

/// Model selection and request shaping
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL without the `/chat/completions` suffix
    pub api_base: String,
    pub max_tokens: u32,
    /// Ask the provider to leave reasoning traces out of the reply
    pub exclude_reasoning: bool,
}

impl ModelConfig {
    /// Full endpoint URL for chat completions
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// Chat completion capability
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run the prompt and return the provider's decoded body unmodified
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, CompletionError>;
}
