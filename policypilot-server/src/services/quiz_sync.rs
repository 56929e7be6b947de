//! Quiz/content synchronization hashing
//!
//! Fingerprints a module's teachable content so quiz regeneration can be
//! skipped when nothing changed and drift can be detected when it has.
//! Hashing is pure: the serialized field order is fixed and inputs are
//! trimmed, so identical content always reproduces the same digest.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// The fields a module quiz is derived from
#[derive(Debug, Clone)]
pub struct QuizSyncSource<'a> {
    pub role_track: &'a str,
    pub title: &'a str,
    pub summary: &'a str,
    pub content_markdown: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashPayload<'a> {
    role_track: &'a str,
    title: &'a str,
    summary: &'a str,
    content_markdown: &'a str,
}

/// Deterministic SHA-256 digest over the trimmed source fields in stable
/// order, hex-encoded
pub fn compute_quiz_sync_hash(source: &QuizSyncSource<'_>) -> String {
    let payload = HashPayload {
        role_track: source.role_track.trim(),
        title: source.title.trim(),
        summary: source.summary.trim(),
        content_markdown: source.content_markdown.trim(),
    };

    // Struct serialization preserves field order, so this is stable
    let json = serde_json::to_string(&payload).unwrap_or_default();
    format!("{:x}", Sha256::digest(json.as_bytes()))
}

/// True when no hash is stored yet, or when the stored hash no longer
/// matches the current content
pub fn quiz_needs_regeneration(stored_hash: Option<&str>, source: &QuizSyncSource<'_>) -> bool {
    match stored_hash {
        None => true,
        Some(stored) if stored.is_empty() => true,
        Some(stored) => stored != compute_quiz_sync_hash(source),
    }
}
