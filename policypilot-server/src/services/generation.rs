//! Campaign generation pipeline
//!
//! Two-stage generation: module drafts per role track, then one quiz per
//! module. Each stage independently degrades to a deterministic generator
//! when the AI backend is unreachable, slow, or returns output outside the
//! schema bounds, so generation never fails from the caller's view.
//!
//! Output always carries flow version 2 and a quiz-sync hash per module.

use futures::future::join_all;
use policypilot_common::config::GeneratorConfig;
use policypilot_common::types::{MediaKind, MediaStatus, RoleTrack, TRACK_ORDER};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    GeneratedCampaignDraft, GeneratedModule, LearningDraft, MediaEmbed, MediaSuggestion,
    ModuleDraft, QuizDraft, QuizQuestion,
};
use crate::services::quiz_sync::{compute_quiz_sync_hash, QuizSyncSource};

/// Campaign content is always generated at flow version 2 (media embeds +
/// hashed quiz sync); the pipeline never emits legacy v1 output
pub const GENERATED_FLOW_VERSION: i64 = 2;

const MAX_PROMPT_OBLIGATIONS: usize = 30;
const FALLBACK_OBLIGATION_HIGHLIGHTS: usize = 4;

/// One extracted policy obligation feeding generation
#[derive(Debug, Clone)]
pub struct ObligationInput {
    pub detail: String,
    pub role_track: RoleTrack,
}

/// Input to the full campaign draft pipeline
#[derive(Debug, Clone)]
pub struct GenerateDraftInput {
    pub campaign_name: String,
    pub obligations: Vec<ObligationInput>,
    pub role_tracks: Vec<RoleTrack>,
}

/// Input to stage-two quiz generation for one module
#[derive(Debug, Clone)]
pub struct QuizGenerationInput {
    pub role_track: RoleTrack,
    pub title: String,
    pub summary: String,
    pub content_markdown: String,
}

/// Dedupe the requested tracks into canonical order (exec, builder,
/// general); an empty request means all three
pub fn ordered_tracks(role_tracks: &[RoleTrack]) -> Vec<RoleTrack> {
    let filtered: Vec<RoleTrack> = TRACK_ORDER
        .into_iter()
        .filter(|track| role_tracks.contains(track))
        .collect();

    if filtered.is_empty() {
        TRACK_ORDER.to_vec()
    } else {
        filtered
    }
}

fn obligations_by_track(input: &GenerateDraftInput) -> HashMap<RoleTrack, Vec<String>> {
    let mut by_track: HashMap<RoleTrack, Vec<String>> = HashMap::new();
    for obligation in &input.obligations {
        by_track
            .entry(obligation.role_track)
            .or_default()
            .push(obligation.detail.clone());
    }
    by_track
}

/// Deterministic module draft for one track: templated title, obligation
/// bullet list, fixed pass score, and two canned media suggestions
fn fallback_module(
    campaign_name: &str,
    track: RoleTrack,
    track_index: usize,
    obligations: &[String],
) -> ModuleDraft {
    let bullet_list = if obligations.is_empty() {
        "- Follow approved AI use cases and escalate uncertainty early.".to_string()
    } else {
        obligations
            .iter()
            .take(FALLBACK_OBLIGATION_HIGHLIGHTS)
            .map(|item| format!("- {}", item))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let role_label = track.label();

    ModuleDraft {
        role_track: track,
        title: format!("{}: {} Readiness", campaign_name, role_label),
        summary: format!(
            "Policy-grounded training for {} teams with concrete behavior standards and escalation paths.",
            track
        ),
        content_markdown: format!(
            "## Why this matters\n\nYour role has direct accountability for compliant AI usage and policy adherence.\n\n## What you need to know\n\n{}\n\n## Practical decisions\n\n- Choose approved tools and approved data boundaries.\n- Escalate uncertainty before release decisions.\n- Preserve evidence and change logs for audits.\n\n## When to escalate\n\nEscalate to legal/security when policy interpretation is unclear or customer-impacting decisions are involved.",
            bullet_list
        ),
        pass_score: 80,
        estimated_minutes: (10 + 2 * track_index) as u32,
        media_suggestions: vec![
            MediaSuggestion {
                kind: MediaKind::Image,
                title: format!("{} policy decision map", role_label),
                caption: "Visual map of escalation and approval checkpoints for this role track."
                    .to_string(),
                suggestion_prompt:
                    "Create a clean process diagram showing policy decision checkpoints, escalation owners, and audit evidence outputs."
                        .to_string(),
            },
            MediaSuggestion {
                kind: MediaKind::Video,
                title: format!("{} scenario walkthrough", role_label),
                caption: "Short scenario walkthrough showing compliant and non-compliant outcomes."
                    .to_string(),
                suggestion_prompt:
                    "Record a 60-90 second scenario walkthrough for this role track showing one compliant and one non-compliant policy decision."
                        .to_string(),
            },
        ],
    }
}

/// Deterministic 3-question quiz parameterized only by the role label
fn fallback_quiz(input: &QuizGenerationInput) -> Vec<QuizQuestion> {
    let role_label = input.role_track.label();

    vec![
        QuizQuestion {
            prompt: format!(
                "For {} teams, what is the safest first action when policy direction is unclear?",
                role_label
            ),
            choices: vec![
                "Proceed quickly and document later".to_string(),
                "Escalate to policy/security/legal owner before execution".to_string(),
                "Ask for informal peer approval only".to_string(),
                "Ignore the work item".to_string(),
            ],
            correct_choice_index: 1,
            explanation: "Escalation before execution preserves compliant, auditable decision quality."
                .to_string(),
        },
        QuizQuestion {
            prompt: "Which behavior best aligns with enterprise AI policy controls?".to_string(),
            choices: vec![
                "Use unapproved tools when deadlines are tight".to_string(),
                "Skip change logs to move faster".to_string(),
                "Follow approved tools, boundaries, and review gates".to_string(),
                "Share sensitive inputs in public systems".to_string(),
            ],
            correct_choice_index: 2,
            explanation: "Approved tools and review gates are required to enforce policy controls."
                .to_string(),
        },
        QuizQuestion {
            prompt: "What outcome does this learning module primarily support?".to_string(),
            choices: vec![
                "Reducing need for legal review".to_string(),
                "Increasing slide count".to_string(),
                "Creating role-specific policy behavior with audit-ready evidence".to_string(),
                "Replacing engineering standards".to_string(),
            ],
            correct_choice_index: 2,
            explanation:
                "The module is designed for role-specific behavior change with evidence-ready compliance outcomes."
                    .to_string(),
        },
    ]
}

/// Merge an optional AI stage-one response with the deterministic
/// fallback: first AI module per track wins, missing tracks are filled
/// from the fallback, output follows canonical track order
fn normalize_stage_one(
    input: &GenerateDraftInput,
    ai_draft: Option<LearningDraft>,
) -> Vec<ModuleDraft> {
    let tracks = ordered_tracks(&input.role_tracks);
    let by_track = obligations_by_track(input);
    let empty: Vec<String> = Vec::new();

    let mut ai_by_track: HashMap<RoleTrack, ModuleDraft> = HashMap::new();
    if let Some(draft) = ai_draft {
        for module in draft.modules {
            ai_by_track.entry(module.role_track).or_insert(module);
        }
    }

    tracks
        .iter()
        .enumerate()
        .map(|(index, track)| match ai_by_track.remove(track) {
            Some(module) => module,
            None => fallback_module(
                &input.campaign_name,
                *track,
                index,
                by_track.get(track).unwrap_or(&empty),
            ),
        })
        .collect()
}

/// Convert media suggestions into suggested embeds, one per suggestion,
/// order preserved
fn to_media_embeds(suggestions: &[MediaSuggestion]) -> Vec<MediaEmbed> {
    suggestions
        .iter()
        .enumerate()
        .map(|(index, suggestion)| MediaEmbed {
            id: Uuid::new_v4(),
            kind: suggestion.kind,
            title: suggestion.title.clone(),
            caption: suggestion.caption.clone(),
            suggestion_prompt: suggestion.suggestion_prompt.clone(),
            asset_path: None,
            mime_type: None,
            status: MediaStatus::Suggested,
            order: index as u32,
        })
        .collect()
}

fn quiz_input_for(module: &ModuleDraft) -> QuizGenerationInput {
    QuizGenerationInput {
        role_track: module.role_track,
        title: module.title.clone(),
        summary: module.summary.clone(),
        content_markdown: module.content_markdown.clone(),
    }
}

/// Client for an OpenAI-compatible structured-output endpoint.
///
/// Every call is fallible by design; callers treat any error, timeout, or
/// schema violation as "no AI output" and fall through to the
/// deterministic generator.
pub struct AiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl AiClient {
    pub fn new(endpoint: String, api_key: String, model: String, timeout_seconds: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_seconds))
                .build()
                .unwrap_or_default(),
            endpoint,
            api_key,
            model,
        }
    }

    async fn structured_completion(
        &self,
        system: &str,
        user: &str,
        schema_name: &str,
        schema: Value,
    ) -> Option<Value> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema_name,
                    "strict": true,
                    "schema": schema,
                },
            },
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), schema = schema_name, "Generator backend error");
            return None;
        }

        let payload: Value = response.json().await.ok()?;
        let content = payload
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()?;

        serde_json::from_str(content).ok()
    }

    fn learning_draft_schema() -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["modules"],
            "properties": {
                "modules": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": 3,
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": [
                            "roleTrack", "title", "summary", "contentMarkdown",
                            "passScore", "estimatedMinutes", "mediaSuggestions"
                        ],
                        "properties": {
                            "roleTrack": {"type": "string", "enum": ["exec", "builder", "general"]},
                            "title": {"type": "string", "minLength": 5, "maxLength": 120},
                            "summary": {"type": "string", "minLength": 20, "maxLength": 300},
                            "contentMarkdown": {"type": "string", "minLength": 80, "maxLength": 5000},
                            "passScore": {"type": "integer", "minimum": 60, "maximum": 100},
                            "estimatedMinutes": {"type": "integer", "minimum": 3, "maximum": 40},
                            "mediaSuggestions": {
                                "type": "array",
                                "minItems": 1,
                                "maxItems": 4,
                                "items": {
                                    "type": "object",
                                    "additionalProperties": false,
                                    "required": ["kind", "title", "caption", "suggestionPrompt"],
                                    "properties": {
                                        "kind": {"type": "string", "enum": ["image", "video"]},
                                        "title": {"type": "string", "minLength": 3, "maxLength": 120},
                                        "caption": {"type": "string", "minLength": 6, "maxLength": 320},
                                        "suggestionPrompt": {"type": "string", "minLength": 10, "maxLength": 420},
                                    },
                                },
                            },
                        },
                    },
                },
            },
        })
    }

    fn quiz_schema() -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["quizQuestions"],
            "properties": {
                "quizQuestions": {
                    "type": "array",
                    "minItems": 3,
                    "maxItems": 8,
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["prompt", "choices", "correctChoiceIndex", "explanation"],
                        "properties": {
                            "prompt": {"type": "string", "minLength": 12, "maxLength": 220},
                            "choices": {
                                "type": "array",
                                "minItems": 4,
                                "maxItems": 4,
                                "items": {"type": "string", "minLength": 1, "maxLength": 180},
                            },
                            "correctChoiceIndex": {"type": "integer", "minimum": 0, "maximum": 3},
                            "explanation": {"type": "string", "minLength": 10, "maxLength": 320},
                        },
                    },
                },
            },
        })
    }

    /// Stage-one request; None on any failure or out-of-bounds response
    async fn learning_draft(&self, input: &GenerateDraftInput) -> Option<LearningDraft> {
        let tracks = ordered_tracks(&input.role_tracks);
        let track_list = tracks
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut prompt = vec![
            format!(
                "Create role-specific learning modules for this campaign: {}.",
                input.campaign_name
            ),
            format!("Only include these role tracks: {}.", track_list),
            "For each module, focus on role-specific explanation, practical behavior guidance, and escalation rules.".to_string(),
            "Provide 1-4 media suggestions per module. Suggestions should be practical and enterprise-safe.".to_string(),
            "Policy obligations:".to_string(),
        ];
        for obligation in input.obligations.iter().take(MAX_PROMPT_OBLIGATIONS) {
            prompt.push(format!("- [{}] {}", obligation.role_track, obligation.detail));
        }

        let value = self
            .structured_completion(
                "You are an enterprise compliance learning designer. Return strict JSON matching the schema.",
                &prompt.join("\n"),
                "learning_draft",
                Self::learning_draft_schema(),
            )
            .await?;

        let draft: LearningDraft = serde_json::from_value(value).ok()?;
        draft.validate().then_some(draft)
    }

    /// Stage-two request; None on any failure or out-of-bounds response
    async fn module_quiz(&self, input: &QuizGenerationInput) -> Option<Vec<QuizQuestion>> {
        let prompt = format!(
            "Generate a quiz for the following learning module.\n\n\
             Quiz should validate behavior-level understanding and decision quality.\n\n\
             Role track: {}\n\nModule title: {}\n\nSummary: {}\n\nContent:\n\n{}",
            input.role_track, input.title, input.summary, input.content_markdown
        );

        let value = self
            .structured_completion(
                "You are an enterprise compliance assessment designer. Return strict JSON matching the schema.",
                &prompt,
                "module_quiz",
                Self::quiz_schema(),
            )
            .await?;

        let draft: QuizDraft = serde_json::from_value(value).ok()?;
        draft.validate().then_some(draft.quiz_questions)
    }
}

/// Campaign/quiz generator: AI-backed with a deterministic fall-through, or
/// deterministic only. Selected once at startup from configuration.
pub enum Generator {
    AiBacked(AiClient),
    Deterministic,
}

impl Generator {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        match (&config.endpoint, &config.api_key) {
            (Some(endpoint), Some(api_key)) => Generator::AiBacked(AiClient::new(
                endpoint.clone(),
                api_key.clone(),
                config.model().to_string(),
                config.timeout_seconds(),
            )),
            _ => Generator::Deterministic,
        }
    }

    /// Generate the full campaign draft. Infallible: every backend failure
    /// path has a deterministic substitute.
    pub async fn generate_campaign_draft(&self, input: &GenerateDraftInput) -> GeneratedCampaignDraft {
        let stage_one = match self {
            Generator::AiBacked(client) => client.learning_draft(input).await,
            Generator::Deterministic => None,
        };

        let drafts = normalize_stage_one(input, stage_one);

        // Quiz generation per module is independent: one module's backend
        // failure falls back without affecting the others
        let modules = join_all(drafts.into_iter().map(|draft| async move {
            let quiz_questions = self.generate_module_quiz(&quiz_input_for(&draft)).await;
            let media_embeds = to_media_embeds(&draft.media_suggestions);
            let quiz_sync_hash = compute_quiz_sync_hash(&QuizSyncSource {
                role_track: draft.role_track.as_str(),
                title: &draft.title,
                summary: &draft.summary,
                content_markdown: &draft.content_markdown,
            });

            GeneratedModule {
                role_track: draft.role_track,
                title: draft.title,
                summary: draft.summary,
                content_markdown: draft.content_markdown,
                pass_score: draft.pass_score,
                estimated_minutes: draft.estimated_minutes,
                media_embeds,
                quiz_questions,
                quiz_sync_hash,
            }
        }))
        .await;

        GeneratedCampaignDraft {
            flow_version: GENERATED_FLOW_VERSION,
            modules,
        }
    }

    /// Generate a quiz for one module. Infallible for the same reason.
    pub async fn generate_module_quiz(&self, input: &QuizGenerationInput) -> Vec<QuizQuestion> {
        match self {
            Generator::AiBacked(client) => match client.module_quiz(input).await {
                Some(questions) => questions,
                None => fallback_quiz(input),
            },
            Generator::Deterministic => fallback_quiz(input),
        }
    }
}
