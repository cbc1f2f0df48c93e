//! ============================================================================
//! Relay Chat - Persona-only passthrough backend
//! ============================================================================
//! The lightweight variant: no memory, no intents, no post-processing.
//! The message is cleaned (case kept), wrapped in the relay persona and the
//! provider body is returned as-is.
//! ============================================================================

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::completion::CompletionProvider;
use crate::persona::RELAY_PERSONA_PROMPT;
use crate::prompt::PromptBuilder;
use crate::types::{CompletionError, Intent};

pub struct RelayChat {
    provider: Arc<dyn CompletionProvider>,
    prompts: PromptBuilder,
}

impl RelayChat {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::new(RELAY_PERSONA_PROMPT),
        }
    }

    pub async fn handle(&self, message: &str) -> Result<Value, CompletionError> {
        let cleaned = clean(message);
        debug!("Relaying {} char message", cleaned.chars().count());

        let messages = self.prompts.build(Intent::General, None, &cleaned);
        self.provider.complete(&messages).await
    }
}

/// Keep only alphanumerics and whitespace, then strip
fn clean(message: &str) -> String {
    let kept: String = message
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.trim().to_string()
}
