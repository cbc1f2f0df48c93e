//! ============================================================================
//! Completion Client - OpenAI-compatible chat completions over HTTP
//! ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::retry::{retry_on_timeout, AttemptError, RetryPolicy};
use super::{CompletionProvider, ModelConfig};
use crate::types::{ChatMessage, CompletionError};

/// Request payload for the chat completions endpoint
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<ReasoningOptions>,
}

#[derive(Debug, Serialize)]
struct ReasoningOptions {
    exclude: bool,
}

/// Completion provider backed by a hosted chat-completion API
pub struct CompletionClient {
    client: reqwest::Client,
    model: ModelConfig,
    retry: RetryPolicy,
}

impl CompletionClient {
    /// Create a new CompletionClient
    pub fn new(model: ModelConfig, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            model,
            retry,
        }
    }

    fn payload<'a>(&'a self, messages: &'a [ChatMessage]) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model.model,
            messages,
            max_tokens: self.model.max_tokens,
            stream: false,
            reasoning: self
                .model
                .exclude_reasoning
                .then_some(ReasoningOptions { exclude: true }),
        }
    }

    /// One HTTP call, bounded by the per-request timeout
    async fn attempt(&self, messages: &[ChatMessage], n: u32) -> Result<Value, AttemptError> {
        debug!(
            "Completion attempt {} to {} ({} messages)",
            n,
            self.model.model,
            messages.len()
        );
        let started = Instant::now();

        let response = self
            .client
            .post(self.model.endpoint())
            .header("Authorization", format!("Bearer {}", self.model.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.retry.request_timeout)
            .json(&self.payload(messages))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(classify_transport)?;
        info!(
            "Completion response time: {:.2}s (status {})",
            started.elapsed().as_secs_f64(),
            status
        );

        if status.is_success() {
            return serde_json::from_slice(&body)
                .map_err(|e| CompletionError::Decode(e.to_string()).into());
        }

        // Provider error bodies in JSON are passed through to the caller
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => {
                warn!("Completion provider answered {}; passing body through", status);
                Ok(value)
            }
            Err(_) => Err(CompletionError::Provider {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }
            .into()),
        }
    }
}

fn classify_transport(e: reqwest::Error) -> AttemptError {
    if e.is_timeout() {
        AttemptError::Timeout
    } else {
        AttemptError::Fatal(CompletionError::Transport(e.to_string()))
    }
}

#[async_trait]
impl CompletionProvider for CompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, CompletionError> {
        retry_on_timeout(&self.retry, |n| self.attempt(messages, n)).await
    }
}
