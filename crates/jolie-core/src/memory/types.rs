//! ============================================================================
//! Memory Types - Persisted user profile structures
//! ============================================================================
//! The profile row as stored remotely, and the partial-update payload.
//! ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object column
pub type JsonMap = Map<String, Value>;

/// The persisted per-user record ("memory").
///
/// `identifier` is the unique, immutable row key. It maps to the `email`
/// column and also accepts `identifier` on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "email", alias = "identifier")]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_profile: Option<JsonMap>,
    /// Known keys: fragrance, texture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl UserProfile {
    /// Create an empty profile for an identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    /// Apply a partial update. Provided fields replace stored ones.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = Some(name.clone());
        }
        if let Some(language) = &update.language {
            self.language = Some(language.clone());
        }
        if let Some(skin_type) = &update.skin_type {
            self.skin_type = Some(skin_type.clone());
        }
        if let Some(tone_profile) = &update.tone_profile {
            self.tone_profile = Some(tone_profile.clone());
        }
        if let Some(preferences) = &update.preferences {
            self.preferences = Some(preferences.clone());
        }
        if let Some(meta) = &update.meta {
            self.meta = Some(meta.clone());
        }
    }
}

/// Partial update of a profile. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_profile: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<JsonMap>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.language.is_none()
            && self.skin_type.is_none()
            && self.tone_profile.is_none()
            && self.preferences.is_none()
            && self.meta.is_none()
    }
}
