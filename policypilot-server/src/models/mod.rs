//! Data models for policypilot-server

pub mod content;
pub mod responses;

pub use content::{
    GeneratedCampaignDraft, GeneratedModule, LearningDraft, MediaEmbed, MediaSuggestion,
    ModuleDraft, QuizDraft, QuizQuestion,
};
pub use responses::{NudgeResponse, PublishResponse};
