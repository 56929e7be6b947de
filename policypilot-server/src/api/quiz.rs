//! Quiz regeneration endpoint
//!
//! Regenerates a module's quiz when the module content has drifted from
//! the content the quiz was generated against, detected via the stored
//! sync hash. `force` bypasses the hash check.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use policypilot_common::types::{CampaignStatus, OrgRole};

use crate::auth::{require_org_role, AuthContext};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::services::generation::QuizGenerationInput;
use crate::services::quiz_sync::{compute_quiz_sync_hash, quiz_needs_regeneration, QuizSyncSource};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/orgs/:org_id/campaigns/:campaign_id/modules/:module_id/quiz/regenerate",
        post(regenerate_quiz),
    )
}

#[derive(Debug, Deserialize, Default)]
struct RegenerateRequest {
    #[serde(default)]
    force: bool,
}

async fn regenerate_quiz(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((org_id, campaign_id, module_id)): Path<(Uuid, Uuid, Uuid)>,
    body: Option<Json<RegenerateRequest>>,
) -> ApiResult<Json<Value>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Admin).await?;

    let campaign = db::campaigns::load_campaign(&state.db, org_id, campaign_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found.".to_string()))?;

    if campaign.status != CampaignStatus::Draft {
        return Err(ApiError::Conflict(
            "Quizzes can only be regenerated while the campaign is in draft.".to_string(),
        ));
    }

    let module = db::campaigns::load_module(&state.db, campaign_id, module_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Module not found.".to_string()))?;

    let force = body.map(|Json(b)| b.force).unwrap_or(false);

    let source = QuizSyncSource {
        role_track: module.role_track.as_str(),
        title: &module.title,
        summary: &module.summary,
        content_markdown: &module.content_markdown,
    };

    if !force && !quiz_needs_regeneration(module.quiz_sync_hash.as_deref(), &source) {
        let questions = db::campaigns::quiz_questions_for_module(&state.db, module_id).await?;
        return Ok(Json(json!({
            "ok": true,
            "regenerated": false,
            "quizSyncHash": module.quiz_sync_hash,
            "questionCount": questions.len(),
        })));
    }

    let questions = state
        .generator
        .generate_module_quiz(&QuizGenerationInput {
            role_track: module.role_track,
            title: module.title.clone(),
            summary: module.summary.clone(),
            content_markdown: module.content_markdown.clone(),
        })
        .await;

    let new_hash = compute_quiz_sync_hash(&source);
    db::campaigns::replace_module_quiz(&state.db, module_id, &questions, &new_hash).await?;

    tracing::info!(
        campaign_id = %campaign_id,
        module_id = %module_id,
        questions = questions.len(),
        "Module quiz regenerated"
    );

    db::audit::write_request_audit_log_best_effort(
        &state.db,
        &db::audit::AuditLogEntry {
            request_id: Uuid::new_v4(),
            route: "/api/orgs/:org_id/campaigns/:campaign_id/modules/:module_id/quiz/regenerate",
            action: "module_quiz_regenerate",
            status_code: 200,
            org_id,
            user_id: auth.user_id,
            metadata: json!({
                "campaignId": campaign_id.to_string(),
                "moduleId": module_id.to_string(),
                "forced": force,
                "questionCount": questions.len(),
            }),
        },
    )
    .await;

    Ok(Json(json!({
        "ok": true,
        "regenerated": true,
        "quizSyncHash": new_hash,
        "questionCount": questions.len(),
    })))
}
