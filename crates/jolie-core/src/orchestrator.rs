//! ============================================================================
//! Chat Orchestrator - Per-request conversation pipeline
//! ============================================================================
//! Each request ends at the first matching branch:
//! 1. Greeting from someone without a profile → onboarding reply
//! 2. Identified newcomer who shared a name or skin type → profile created,
//!    confirmation reply
//! 3. Otherwise → optional profile update, prompt, completion, post-processing
//!
//! No state is kept between requests; everything durable lives in the store.
//! ============================================================================

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::completion::CompletionProvider;
use crate::intent::classify;
use crate::memory::{extract_fields, ExtractedFields, JsonMap, MemoryStore, UserProfile};
use crate::persona::{CAPTURE_CONFIRMATION, ONBOARDING_REPLY, PROFILE_SOURCE};
use crate::postprocess::postprocess;
use crate::prompt::PromptBuilder;
use crate::types::{ChatError, ChatReply, ChatRequest};

static GREETING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(hi|hello|hey|start)\b").expect("valid greeting regex"));

static HULK_SKIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)hulk skin").expect("valid synonym regex"));

/// Two views of the inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    /// Stripped, alphanumerics and whitespace only, user casing kept
    pub cleaned: String,
    /// `cleaned` lower-cased
    pub lowered: String,
}

/// Strip, drop punctuation and symbols, and map playful synonyms
pub fn normalize(raw: &str) -> NormalizedMessage {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let cleaned = HULK_SKIN.replace_all(&cleaned, "sensitive skin").into_owned();
    let lowered = cleaned.to_lowercase();

    NormalizedMessage { cleaned, lowered }
}

/// Whether the message opens the conversation
pub fn is_greeting(lowered: &str) -> bool {
    GREETING.is_match(lowered)
}

/// Sequences extraction, memory, prompting, completion and post-processing
pub struct ChatOrchestrator {
    store: Arc<dyn MemoryStore>,
    provider: Arc<dyn CompletionProvider>,
    prompts: PromptBuilder,
}

impl ChatOrchestrator {
    pub fn new(store: Arc<dyn MemoryStore>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            store,
            provider,
            prompts: PromptBuilder::default(),
        }
    }

    /// Handle one chat request
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let message = normalize(&request.message);
        let extracted = extract_fields(&message.cleaned);
        let identifier = request.identifier();

        let mut profile = match identifier {
            Some(id) => self.store.fetch(id).await?,
            None => None,
        };
        debug!(
            "Profile {} for request",
            if profile.is_some() { "found" } else { "absent" }
        );

        if profile.is_none() && is_greeting(&message.lowered) {
            info!("Greeting without profile, sending onboarding");
            return Ok(ChatReply::Fixed(ONBOARDING_REPLY.to_string()));
        }

        if let (Some(id), None) = (identifier, &profile) {
            if extracted.has_identity() {
                self.capture(id, &extracted, request.session_id.as_deref())
                    .await?;
                return Ok(ChatReply::Fixed(CAPTURE_CONFIRMATION.to_string()));
            }
        }

        let mut memory_updated = false;
        if let (Some(id), Some(stored)) = (identifier, profile.as_mut()) {
            let update = extracted.changes_from(stored);
            if !update.is_empty() {
                let rows = self.store.update(id, &update).await?;
                info!("Profile for {} updated from conversation", id);
                match rows.into_iter().next() {
                    Some(fresh) => *stored = fresh,
                    None => stored.apply(&update),
                }
                memory_updated = true;
            }
        }

        let intent = classify(&message.lowered);
        info!("Intent: {}", intent);

        let messages = self
            .prompts
            .build(intent, profile.as_ref(), &message.lowered);
        let body = self.provider.complete(&messages).await?;

        Ok(ChatReply::Completion {
            body: postprocess(body, intent),
            memory_updated,
        })
    }

    /// Create the first profile for a newcomer
    async fn capture(
        &self,
        identifier: &str,
        extracted: &ExtractedFields,
        session_id: Option<&str>,
    ) -> Result<(), ChatError> {
        let mut meta = JsonMap::new();
        meta.insert("source".to_string(), Value::String(PROFILE_SOURCE.to_string()));
        meta.insert(
            "session_id".to_string(),
            Value::String(session_id.unwrap_or("unknown").to_string()),
        );

        let profile = UserProfile {
            meta: Some(meta),
            timestamp: Some(Utc::now().to_rfc3339()),
            ..extracted.to_profile(identifier)
        };

        self.store.create(&profile).await?;
        info!("Captured new profile for {}", identifier);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, ProfileUpdate};
    use crate::persona::{MEMORY_CONFIRMATION, PERSONA_PROMPT, PRODUCT_HOOK};
    use crate::types::{ChatMessage, CompletionError, StoreError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Provider that replays a fixed result and records prompts
    struct ScriptedProvider {
        result: Result<Value, CompletionError>,
        calls: AtomicU32,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedProvider {
        fn replying(content: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(json!({
                    "choices": [{"message": {"role": "assistant", "content": content}}]
                })),
                calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(error: CompletionError) -> Arc<Self> {
            Arc::new(Self {
                result: Err(error),
                calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_prompt(&self) -> Vec<ChatMessage> {
            self.prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(messages.to_vec());
            self.result.clone()
        }
    }

    /// In-memory store that counts writes
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryStore,
        creates: AtomicU32,
        updates: AtomicU32,
    }

    impl CountingStore {
        fn empty() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn with_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryStore::with_profiles(profiles),
                ..Self::default()
            })
        }

        fn writes(&self) -> (u32, u32) {
            (
                self.creates.load(Ordering::SeqCst),
                self.updates.load(Ordering::SeqCst),
            )
        }
    }

    #[async_trait]
    impl MemoryStore for CountingStore {
        async fn fetch(&self, identifier: &str) -> Result<Option<UserProfile>, StoreError> {
            self.inner.fetch(identifier).await
        }

        async fn create(&self, profile: &UserProfile) -> Result<Vec<UserProfile>, StoreError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.inner.create(profile).await
        }

        async fn update(
            &self,
            identifier: &str,
            update: &ProfileUpdate,
        ) -> Result<Vec<UserProfile>, StoreError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner.update(identifier, update).await
        }

        async fn delete(&self, identifier: &str) -> Result<(), StoreError> {
            self.inner.delete(identifier).await
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    /// Store that is always unreachable
    struct DownStore;

    #[async_trait]
    impl MemoryStore for DownStore {
        async fn fetch(&self, _: &str) -> Result<Option<UserProfile>, StoreError> {
            Err(StoreError::Request("connection refused".to_string()))
        }

        async fn create(&self, _: &UserProfile) -> Result<Vec<UserProfile>, StoreError> {
            Err(StoreError::Request("connection refused".to_string()))
        }

        async fn update(&self, _: &str, _: &ProfileUpdate) -> Result<Vec<UserProfile>, StoreError> {
            Err(StoreError::Request("connection refused".to_string()))
        }

        async fn delete(&self, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Request("connection refused".to_string()))
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Err(StoreError::Request("connection refused".to_string()))
        }
    }

    fn ana_profile() -> UserProfile {
        UserProfile {
            name: Some("Ana".to_string()),
            skin_type: Some("dry".to_string()),
            ..UserProfile::new("ana@example.com")
        }
    }

    #[test]
    fn test_normalize() {
        let message = normalize("  Hi, I'm Ana! I have HULK skin :)  ");
        assert_eq!(message.cleaned, "Hi Im Ana I have sensitive skin ");
        assert_eq!(message.lowered, "hi im ana i have sensitive skin ");
    }

    #[test]
    fn test_greeting_is_whole_word() {
        assert!(is_greeting("hi there"));
        assert!(is_greeting("lets start"));
        assert!(!is_greeting("this is my history"));
        assert!(!is_greeting("theyre here"));
    }

    #[tokio::test]
    async fn test_greeting_without_profile_onboards() {
        let store = CountingStore::empty();
        let provider = ScriptedProvider::replying("unused");
        let orchestrator = ChatOrchestrator::new(store.clone(), provider.clone());

        let reply = orchestrator
            .handle(&ChatRequest::new("Hi!").with_identifier("new@example.com"))
            .await
            .unwrap();

        assert_eq!(reply, ChatReply::Fixed(ONBOARDING_REPLY.to_string()));
        assert_eq!(store.writes(), (0, 0));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_first_capture_creates_profile() {
        let store = CountingStore::empty();
        let provider = ScriptedProvider::replying("unused");
        let orchestrator = ChatOrchestrator::new(store.clone(), provider.clone());

        let reply = orchestrator
            .handle(
                &ChatRequest::new("my name is Ana and I have dry skin")
                    .with_identifier("ana@example.com"),
            )
            .await
            .unwrap();

        assert_eq!(reply, ChatReply::Fixed(CAPTURE_CONFIRMATION.to_string()));
        assert_eq!(store.writes(), (1, 0));
        assert_eq!(provider.calls(), 0);

        let saved = store.fetch("ana@example.com").await.unwrap().unwrap();
        assert_eq!(saved.name.as_deref(), Some("Ana"));
        assert_eq!(saved.skin_type.as_deref(), Some("dry"));
        assert!(saved.timestamp.is_some());
        let meta = saved.meta.unwrap();
        assert_eq!(meta["source"], "chatbot");
        assert_eq!(meta["session_id"], "unknown");
    }

    #[tokio::test]
    async fn test_capture_records_session() {
        let store = CountingStore::empty();
        let orchestrator =
            ChatOrchestrator::new(store.clone(), ScriptedProvider::replying("unused"));

        orchestrator
            .handle(
                &ChatRequest::new("I have oily skin")
                    .with_identifier("ana@example.com")
                    .with_session("sess-42"),
            )
            .await
            .unwrap();

        let saved = store.fetch("ana@example.com").await.unwrap().unwrap();
        assert_eq!(saved.meta.unwrap()["session_id"], "sess-42");
    }

    #[tokio::test]
    async fn test_anonymous_message_goes_to_completion() {
        let store = CountingStore::empty();
        let provider = ScriptedProvider::replying("Drink water.");
        let orchestrator = ChatOrchestrator::new(store.clone(), provider.clone());

        let reply = orchestrator
            .handle(&ChatRequest::new("My name is Ana. What now?"))
            .await
            .unwrap();

        assert_eq!(store.writes(), (0, 0));
        assert_eq!(provider.calls(), 1);
        match reply {
            ChatReply::Completion { body, memory_updated } => {
                assert!(!memory_updated);
                assert_eq!(body["choices"][0]["message"]["content"], "Drink water.");
            }
            other => panic!("expected completion, got {:?}", other),
        }

        let prompt = provider.last_prompt();
        assert_eq!(prompt[0].content, PERSONA_PROMPT);
        assert_eq!(prompt[1], ChatMessage::user("my name is ana what now"));
    }

    #[tokio::test]
    async fn test_known_user_greeting_reaches_completion() {
        let store = CountingStore::with_profiles([ana_profile()]);
        let provider = ScriptedProvider::replying("Welcome back.");
        let orchestrator = ChatOrchestrator::new(store.clone(), provider.clone());

        let reply = orchestrator
            .handle(&ChatRequest::new("hello").with_identifier("ana@example.com"))
            .await
            .unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(store.writes(), (0, 0));
        assert!(provider.last_prompt()[0]
            .content
            .contains("User profile: name: Ana; skin type: dry"));
        assert!(matches!(
            reply,
            ChatReply::Completion { memory_updated: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_new_facts_update_profile() {
        let store = CountingStore::with_profiles([ana_profile()]);
        let provider = ScriptedProvider::replying("Try a gel cleanser.");
        let orchestrator = ChatOrchestrator::new(store.clone(), provider.clone());

        let reply = orchestrator
            .handle(
                &ChatRequest::new("Actually I have oily skin and I like citrus fragrance")
                    .with_identifier("ana@example.com"),
            )
            .await
            .unwrap();

        assert_eq!(store.writes(), (0, 1));
        let saved = store.fetch("ana@example.com").await.unwrap().unwrap();
        assert_eq!(saved.skin_type.as_deref(), Some("oily"));
        assert_eq!(saved.preferences.unwrap()["fragrance"], "citrus");

        assert!(provider.last_prompt()[0].content.contains("skin type: oily"));

        let body = reply.into_json();
        assert_eq!(body["jolie_memory"], MEMORY_CONFIRMATION);
        let content = body["choices"][0]["message"]["content"].as_str().unwrap();
        assert_eq!(content, format!("Try a gel cleanser.{}", PRODUCT_HOOK));
    }

    #[tokio::test]
    async fn test_repeated_facts_do_not_write() {
        let store = CountingStore::with_profiles([ana_profile()]);
        let orchestrator =
            ChatOrchestrator::new(store.clone(), ScriptedProvider::replying("Noted."));

        orchestrator
            .handle(&ChatRequest::new("I have dry skin").with_identifier("ana@example.com"))
            .await
            .unwrap();
        assert_eq!(store.writes(), (0, 0));
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let store = CountingStore::with_profiles([ana_profile()]);
        let provider = ScriptedProvider::failing(CompletionError::AllRetriesFailed { attempts: 2 });
        let orchestrator = ChatOrchestrator::new(store, provider);

        let err = orchestrator
            .handle(&ChatRequest::new("what about my routine").with_identifier("ana@example.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ChatError::Completion(CompletionError::AllRetriesFailed { attempts: 2 })
        );
    }

    #[tokio::test]
    async fn test_store_failure_short_circuits() {
        let provider = ScriptedProvider::replying("unused");
        let orchestrator = ChatOrchestrator::new(Arc::new(DownStore), provider.clone());

        let err = orchestrator
            .handle(&ChatRequest::new("help me").with_identifier("ana@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Store(StoreError::Request(_))));
        assert_eq!(provider.calls(), 0);
    }
}
