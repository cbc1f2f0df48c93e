//! ============================================================================
//! Core Types for the Jolie Backend
//! ============================================================================
//! Request/response shapes, prompt messages, intents and the error taxonomy.
//! These types are serialized to JSON for the HTTP surface.
//! ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persona::MEMORY_CONFIRMATION;

/// Inbound chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// User email; older clients send it as `email`
    #[serde(default, alias = "email")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            identifier: None,
            session_id: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Identifier, treating an empty string as absent
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref().filter(|id| !id.is_empty())
    }
}

/// Role of a prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One entry of the prompt sent to the completion provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Coarse conversational purpose driving prompt specialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    RoutineBuilding,
    SkinIssue,
    HairIssue,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::RoutineBuilding => "routine_building",
            Intent::SkinIssue => "skin_issue",
            Intent::HairIssue => "hair_issue",
            Intent::General => "general",
        }
    }

    /// Whether replies for this intent carry the product hook
    pub fn wants_product_hook(&self) -> bool {
        !matches!(self, Intent::General)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one chat request
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// Canned reply, no completion call was made
    Fixed(String),
    /// Post-processed provider body
    Completion { body: Value, memory_updated: bool },
}

impl ChatReply {
    /// Render the reply as the JSON body returned to the caller
    pub fn into_json(self) -> Value {
        match self {
            ChatReply::Fixed(reply) => serde_json::json!({ "reply": reply }),
            ChatReply::Completion {
                mut body,
                memory_updated,
            } => {
                if memory_updated {
                    if let Some(obj) = body.as_object_mut() {
                        obj.insert(
                            "jolie_memory".to_string(),
                            Value::String(MEMORY_CONFIRMATION.to_string()),
                        );
                    }
                }
                body
            }
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Memory store failures, translated at the store client boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Network failure, non-2xx status, malformed body or empty insert
    #[error("{0}")]
    Request(String),

    /// The store reported no affected rows
    #[error("Memory not found: {0}")]
    NotFound(String),
}

/// Completion provider failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    #[error("All retries failed ({attempts} attempts timed out)")]
    AllRetriesFailed { attempts: u32 },

    #[error("Completion transport error: {0}")]
    Transport(String),

    #[error("Completion provider error ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Failed to decode completion response: {0}")]
    Decode(String),
}

/// Errors that abort a chat request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_accepts_email_alias() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"message": "hi", "email": "ana@example.com"}"#).unwrap();
        assert_eq!(req.identifier(), Some("ana@example.com"));
        assert!(req.session_id.is_none());
    }

    #[test]
    fn test_empty_identifier_is_absent() {
        let req = ChatRequest::new("hi").with_identifier("");
        assert_eq!(req.identifier(), None);
    }

    #[test]
    fn test_message_roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("x")).unwrap();
        assert_eq!(json["role"], "system");
        let json = serde_json::to_value(ChatMessage::user("y")).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_fixed_reply_json() {
        let json = ChatReply::Fixed("hello".to_string()).into_json();
        assert_eq!(json, serde_json::json!({ "reply": "hello" }));
    }

    #[test]
    fn test_completion_reply_memory_flag() {
        let body = serde_json::json!({ "choices": [] });
        let json = ChatReply::Completion {
            body: body.clone(),
            memory_updated: false,
        }
        .into_json();
        assert!(json.get("jolie_memory").is_none());

        let json = ChatReply::Completion {
            body,
            memory_updated: true,
        }
        .into_json();
        assert_eq!(json["jolie_memory"], MEMORY_CONFIRMATION);
    }

    #[test]
    fn test_intent_hook_membership() {
        assert!(Intent::RoutineBuilding.wants_product_hook());
        assert!(Intent::SkinIssue.wants_product_hook());
        assert!(Intent::HairIssue.wants_product_hook());
        assert!(!Intent::General.wants_product_hook());
        assert_eq!(Intent::SkinIssue.to_string(), "skin_issue");
    }
}
