//! ============================================================================
//! JOLIE-CORE: Jolie's Brain
//! ============================================================================
//! This crate handles all conversation logic for the Jolie chat backend:
//! - Message normalization, field extraction and intent classification
//! - Profile memory against a remote row-store
//! - Prompt construction from persona, memory traits and intent guidance
//! - Completion calls with bounded retry-on-timeout
//! - Reply tone trimming and product hooks
//! ============================================================================

pub mod completion;
pub mod config;
pub mod intent;
pub mod memory;
pub mod orchestrator;
pub mod persona;
pub mod postprocess;
pub mod prompt;
pub mod relay;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use types::*;
pub use completion::{CompletionClient, CompletionProvider, ModelConfig, RetryPolicy};
pub use config::{BackendVariant, ConfigError, JolieConfig, StoreConfig};
pub use intent::classify;
pub use memory::{
    extract_fields, ExtractedFields, InMemoryStore, JsonMap, MemoryStore, ProfileUpdate,
    SupabaseStore, UserProfile,
};
pub use orchestrator::{normalize, ChatOrchestrator, NormalizedMessage};
pub use postprocess::postprocess;
pub use prompt::PromptBuilder;
pub use relay::RelayChat;
