//! Campaign content models and generator output validation
//!
//! The draft types mirror the strict JSON schema handed to the generative
//! backend; `validate` rejects any response outside those bounds so invalid
//! output degrades to the deterministic fallback instead of reaching the
//! database.

use policypilot_common::types::{MediaKind, MediaStatus, RoleTrack};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn char_len_in(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

/// A generator-proposed media slot, before it becomes an embed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSuggestion {
    pub kind: MediaKind,
    pub title: String,
    pub caption: String,
    pub suggestion_prompt: String,
}

impl MediaSuggestion {
    pub fn validate(&self) -> bool {
        char_len_in(&self.title, 3, 120)
            && char_len_in(&self.caption, 6, 320)
            && char_len_in(&self.suggestion_prompt, 10, 420)
    }
}

/// Media slot attached to a learning module, persisted in
/// `learning_modules.media_embeds_json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEmbed {
    pub id: Uuid,
    pub kind: MediaKind,
    pub title: String,
    pub caption: String,
    pub suggestion_prompt: String,
    pub asset_path: Option<String>,
    pub mime_type: Option<String>,
    pub status: MediaStatus,
    pub order: u32,
}

/// Four-choice quiz question
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_choice_index: u8,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn validate(&self) -> bool {
        char_len_in(&self.prompt, 12, 220)
            && self.choices.len() == 4
            && self.choices.iter().all(|c| char_len_in(c, 1, 180))
            && self.correct_choice_index <= 3
            && char_len_in(&self.explanation, 10, 320)
    }
}

/// Stage-one module draft (teachable content plus media suggestions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDraft {
    pub role_track: RoleTrack,
    pub title: String,
    pub summary: String,
    pub content_markdown: String,
    pub pass_score: u32,
    pub estimated_minutes: u32,
    pub media_suggestions: Vec<MediaSuggestion>,
}

impl ModuleDraft {
    pub fn validate(&self) -> bool {
        char_len_in(&self.title, 5, 120)
            && char_len_in(&self.summary, 20, 300)
            && char_len_in(&self.content_markdown, 80, 5000)
            && (60..=100).contains(&self.pass_score)
            && (3..=40).contains(&self.estimated_minutes)
            && !self.media_suggestions.is_empty()
            && self.media_suggestions.len() <= 4
            && self.media_suggestions.iter().all(MediaSuggestion::validate)
    }
}

/// Stage-one generator response shape
#[derive(Debug, Clone, Deserialize)]
pub struct LearningDraft {
    pub modules: Vec<ModuleDraft>,
}

impl LearningDraft {
    pub fn validate(&self) -> bool {
        !self.modules.is_empty()
            && self.modules.len() <= 3
            && self.modules.iter().all(ModuleDraft::validate)
    }
}

/// Stage-two generator response shape
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub quiz_questions: Vec<QuizQuestion>,
}

impl QuizDraft {
    pub fn validate(&self) -> bool {
        (3..=8).contains(&self.quiz_questions.len())
            && self.quiz_questions.iter().all(QuizQuestion::validate)
    }
}

/// Fully generated module: content, embeds, quiz, and sync hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedModule {
    pub role_track: RoleTrack,
    pub title: String,
    pub summary: String,
    pub content_markdown: String,
    pub pass_score: u32,
    pub estimated_minutes: u32,
    pub media_embeds: Vec<MediaEmbed>,
    pub quiz_questions: Vec<QuizQuestion>,
    pub quiz_sync_hash: String,
}

/// Generator output for one campaign. `flow_version` is always 2; the
/// pipeline never emits legacy v1 content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCampaignDraft {
    pub flow_version: i64,
    pub modules: Vec<GeneratedModule>,
}
