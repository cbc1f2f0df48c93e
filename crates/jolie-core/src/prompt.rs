//! ============================================================================
//! Prompt Builder - System instruction from persona, memory and intent
//! ============================================================================
//! Layout of the system message:
//! ```text
//! <persona> [User profile: name: X; skin type: Y; preferences: k: v, k: v] [<intent guidance>]
//! ```
//! followed by the user's message as the final entry.
//! ============================================================================

use serde_json::Value;

use crate::memory::UserProfile;
use crate::persona::{intent_guidance, PERSONA_PROMPT};
use crate::types::{ChatMessage, Intent};

/// Assembles the ordered prompt for one request
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: &'static str,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(PERSONA_PROMPT)
    }
}

impl PromptBuilder {
    pub fn new(persona: &'static str) -> Self {
        Self { persona }
    }

    /// System content for an intent and optional stored profile
    pub fn system_prompt(&self, intent: Intent, profile: Option<&UserProfile>) -> String {
        let mut content = self.persona.to_string();

        if let Some(summary) = profile.and_then(profile_summary) {
            content.push(' ');
            content.push_str(&summary);
        }

        if let Some(guidance) = intent_guidance(intent) {
            content.push_str(guidance);
        }

        content
    }

    /// Full prompt: system instruction, then the user message
    pub fn build(
        &self,
        intent: Intent,
        profile: Option<&UserProfile>,
        user_message: &str,
    ) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt(intent, profile)),
            ChatMessage::user(user_message),
        ]
    }
}

/// "User profile: ..." clause listing the traits present on the profile.
/// `None` when the profile carries none of them.
pub fn profile_summary(profile: &UserProfile) -> Option<String> {
    let mut traits = Vec::new();

    if let Some(name) = profile.name.as_deref().filter(|n| !n.is_empty()) {
        traits.push(format!("name: {}", name));
    }
    if let Some(skin_type) = profile.skin_type.as_deref().filter(|s| !s.is_empty()) {
        traits.push(format!("skin type: {}", skin_type));
    }
    if let Some(preferences) = profile.preferences.as_ref().filter(|p| !p.is_empty()) {
        let prefs = preferences
            .iter()
            .map(|(k, v)| format!("{}: {}", k, display_value(v)))
            .collect::<Vec<_>>()
            .join(", ");
        traits.push(format!("preferences: {}", prefs));
    }

    if traits.is_empty() {
        None
    } else {
        Some(format!("User profile: {}", traits.join("; ")))
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
