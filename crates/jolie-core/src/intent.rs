//! ============================================================================
//! Intent Classifier - Keyword-based conversation intents
//! ============================================================================
//! Keyword sets are checked in priority order; the first set with any
//! substring hit wins.
//! ============================================================================

use crate::types::Intent;

pub const ROUTINE_KEYWORDS: &[&str] = &[
    "routine", "develop", "steps", "regimen", "morning", "evening", "template", "ritual",
];

pub const SKIN_KEYWORDS: &[&str] = &[
    "dry", "oily", "acne", "sensitive", "redness", "breakout", "eczema", "texture", "irritation",
];

pub const HAIR_KEYWORDS: &[&str] = &[
    "hair", "scalp", "frizz", "volume", "split ends", "damage", "hydration", "curl", "shine",
];

/// Keyword sets in priority order
const PRIORITY: &[(Intent, &[&str])] = &[
    (Intent::RoutineBuilding, ROUTINE_KEYWORDS),
    (Intent::SkinIssue, SKIN_KEYWORDS),
    (Intent::HairIssue, HAIR_KEYWORDS),
];

/// Classify a message into a conversation intent
pub fn classify(message: &str) -> Intent {
    let lower = message.to_lowercase();

    PRIORITY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::General)
}
