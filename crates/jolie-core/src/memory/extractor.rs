//! ============================================================================
//! Field Extractor - Structured facts from a single utterance
//! ============================================================================
//! Pulls name, skin type and preferences out of a user message using fixed
//! lead phrases. Pure function of the input text.
//!
//! Names are kept exactly as typed (trimmed only). Skin type, fragrance and
//! texture are lower-cased.
//! ============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::types::{JsonMap, ProfileUpdate, UserProfile};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bmy name is ([A-Za-z\-']+)").expect("name pattern"));
static SKIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bi have (\w+) skin").expect("skin pattern"));
static FRAGRANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bi like (\w+) fragrance").expect("fragrance pattern"));
static TEXTURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bi prefer (\w+) texture").expect("texture pattern"));

/// Facts extracted from one message. Never persisted directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_type: Option<String>,
    /// Present only when at least one preference matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<BTreeMap<String, String>>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.skin_type.is_none() && self.preferences.is_none()
    }

    /// Whether the message identified the user (name or skin type)
    pub fn has_identity(&self) -> bool {
        self.name.is_some() || self.skin_type.is_some()
    }

    fn preferences_json(&self) -> Option<JsonMap> {
        self.preferences.as_ref().map(|prefs| {
            prefs
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect()
        })
    }

    /// Build a fresh profile from the extracted fields
    pub fn to_profile(&self, identifier: &str) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            skin_type: self.skin_type.clone(),
            preferences: self.preferences_json(),
            ..UserProfile::new(identifier)
        }
    }

    /// Fields that differ from the stored profile.
    ///
    /// Preferences are merged key-wise into the stored mapping, so the
    /// returned mapping is the full replacement column value.
    pub fn changes_from(&self, profile: &UserProfile) -> ProfileUpdate {
        let mut update = ProfileUpdate::default();

        if let Some(name) = &self.name {
            if profile.name.as_ref() != Some(name) {
                update.name = Some(name.clone());
            }
        }
        if let Some(skin_type) = &self.skin_type {
            if profile.skin_type.as_ref() != Some(skin_type) {
                update.skin_type = Some(skin_type.clone());
            }
        }
        if let Some(prefs) = &self.preferences {
            let stored = profile.preferences.clone().unwrap_or_default();
            let changed = prefs
                .iter()
                .any(|(k, v)| stored.get(k).and_then(Value::as_str) != Some(v.as_str()));
            if changed {
                let mut merged = stored;
                for (k, v) in prefs {
                    merged.insert(k.clone(), Value::String(v.clone()));
                }
                update.preferences = Some(merged);
            }
        }

        update
    }
}

/// Extract profile facts from a message. No match yields an empty result.
pub fn extract_fields(message: &str) -> ExtractedFields {
    let capture = |re: &Regex| {
        re.captures(message)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    let mut fields = ExtractedFields {
        // No autocorrect: keep the user's spelling and casing
        name: capture(&NAME_RE).map(|n| n.trim().to_string()),
        skin_type: capture(&SKIN_RE).map(|s| s.to_lowercase()),
        preferences: None,
    };

    let mut prefs = BTreeMap::new();
    if let Some(fragrance) = capture(&FRAGRANCE_RE) {
        prefs.insert("fragrance".to_string(), fragrance.to_lowercase());
    }
    if let Some(texture) = capture(&TEXTURE_RE) {
        prefs.insert("texture".to_string(), texture.to_lowercase());
    }
    if !prefs.is_empty() {
        fields.preferences = Some(prefs);
    }

    fields
}
