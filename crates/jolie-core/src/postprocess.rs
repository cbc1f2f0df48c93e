//! ============================================================================
//! Response Post-Processing - Tone trimming and product hooks
//! ============================================================================
//! Operates in place on `choices[0].message.content` of the provider body.
//! Trimming and hook-appending are independent steps applied in that order.
//! ============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::persona::{FOLLOW_UP_PROMPT, PRODUCT_HOOK, TRIM_MARKER};
use crate::types::Intent;

/// Replies longer than this many characters are trimmed
pub const MAX_REPLY_CHARS: usize = 500;

/// Sentences kept when trimming
const KEPT_SENTENCES: usize = 2;

/// Sentence boundary: terminal punctuation followed by whitespace
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence boundary regex"));

/// Trim an overlong reply down to its first two sentences, nudging toward
/// recommendations when the kept text doesn't already mention them.
pub fn tone_filter(text: &str) -> String {
    let text = text.trim();

    let mut sentences = Vec::with_capacity(KEPT_SENTENCES);
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        if sentences.len() == KEPT_SENTENCES {
            break;
        }
        // Keep the punctuation, drop the whitespace
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    if sentences.len() < KEPT_SENTENCES && start < text.len() {
        sentences.push(&text[start..]);
    }

    let mut trimmed = sentences.join(" ");
    let lowered = trimmed.to_lowercase();
    if !lowered.contains("recommend") && !lowered.contains("routine") {
        trimmed.push_str(FOLLOW_UP_PROMPT);
    }
    trimmed.push_str(TRIM_MARKER);
    trimmed
}

/// Apply tone trimming and the intent's product hook to a provider body.
/// Bodies without a first choice are returned untouched.
pub fn postprocess(mut body: Value, intent: Intent) -> Value {
    let Some(content) = body
        .pointer_mut("/choices/0/message/content")
        .and_then(|c| match c {
            Value::String(s) => Some(s),
            _ => None,
        })
    else {
        debug!("Completion body has no first choice content; skipping post-processing");
        return body;
    };

    if content.chars().count() > MAX_REPLY_CHARS {
        debug!("Trimming {} char reply", content.chars().count());
        *content = tone_filter(content.as_str());
    }

    if intent.wants_product_hook() {
        content.push_str(PRODUCT_HOOK);
    }

    body
}
