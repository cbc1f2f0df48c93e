//! ============================================================================
//! Memory Module - Persisted user profile for Jolie
//! ============================================================================
//! One profile row per user, keyed by email, held in a remote row-store.
//!
//! ## Features
//! - Point reads, inserts, partial updates and deletes keyed by identifier
//! - Pattern-based extraction of profile facts from a single message
//! - In-process store with the same semantics for tests and demos
//!
//! ## Architecture
//! ```text
//! User Message → extract_fields → ExtractedFields
//!                                       ↓
//!              MemoryStore::fetch → UserProfile? → create / update
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use jolie_core::memory::{MemoryStore, SupabaseStore};
//!
//! let store = SupabaseStore::new(&config.store);
//! let profile = store.fetch("ana@example.com").await?;
//! ```
//! ============================================================================

mod extractor;
mod in_memory;
mod store;
mod types;

// Re-export public types
pub use extractor::{extract_fields, ExtractedFields};
pub use in_memory::InMemoryStore;
pub use store::{MemoryStore, SupabaseStore, IDENTIFIER_COLUMN};
pub use types::{JsonMap, ProfileUpdate, UserProfile};
