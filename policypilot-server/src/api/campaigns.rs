//! Campaign endpoints: creation with generated content, listing, publish,
//! and reminder sends

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use policypilot_common::types::{NudgeMode, OrgRole, RoleTrack};

use crate::auth::{require_org_role, AuthContext};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{NudgeResponse, PublishResponse};
use crate::services::generation::{GenerateDraftInput, ObligationInput};
use crate::services::idempotency::{
    find_idempotent_success, hash_idempotency_key, idempotency_key_from_headers,
};
use crate::services::nudges::{NudgeSender, NUDGE_ACTION};
use crate::services::publish::{CampaignPublisher, PUBLISH_ACTION};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/orgs/:org_id/campaigns",
            get(list_campaigns).post(create_campaign),
        )
        .route("/api/orgs/:org_id/campaigns/:campaign_id", get(campaign_detail))
        .route(
            "/api/orgs/:org_id/campaigns/:campaign_id/publish",
            post(publish_campaign),
        )
        .route(
            "/api/orgs/:org_id/campaigns/:campaign_id/nudges/send",
            post(send_nudges),
        )
}

fn campaign_json(campaign: &db::campaigns::CampaignRow) -> Value {
    json!({
        "id": campaign.id,
        "name": campaign.name,
        "status": campaign.status.as_str(),
        "flowVersion": campaign.flow_version,
        "sourcePolicyId": campaign.source_policy_id,
        "dueAt": campaign.due_at,
        "createdAt": campaign.created_at,
        "publishedAt": campaign.published_at,
    })
}

async fn module_json(state: &AppState, module: &db::campaigns::ModuleRow) -> ApiResult<Value> {
    let questions = db::campaigns::quiz_questions_for_module(&state.db, module.id).await?;
    Ok(json!({
        "id": module.id,
        "roleTrack": module.role_track,
        "title": module.title,
        "summary": module.summary,
        "contentMarkdown": module.content_markdown,
        "passScore": module.pass_score,
        "estimatedMinutes": module.estimated_minutes,
        "mediaEmbeds": module.media_embeds,
        "quizSyncHash": module.quiz_sync_hash,
        "questionCount": questions.len(),
    }))
}

async fn list_campaigns(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Manager).await?;

    let campaigns = db::campaigns::list_campaigns(&state.db, org_id).await?;
    let items: Vec<Value> = campaigns.iter().map(campaign_json).collect();
    Ok(Json(json!({ "campaigns": items })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCampaignRequest {
    name: String,
    source_policy_id: Option<Uuid>,
    due_at: Option<String>,
    #[serde(default)]
    role_tracks: Vec<RoleTrack>,
}

/// Create a draft campaign with generated modules and quizzes. Generation
/// never fails outright: when the AI backend is unavailable the
/// deterministic generator supplies the content.
async fn create_campaign(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(org_id): Path<Uuid>,
    Json(request): Json<CreateCampaignRequest>,
) -> ApiResult<Json<Value>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Admin).await?;

    let name = request.name.trim().to_string();
    if name.chars().count() < 3 || name.chars().count() > 120 {
        return Err(ApiError::Validation(
            "Campaign name must be 3-120 characters.".to_string(),
        ));
    }

    if let Some(due_at) = request.due_at.as_deref() {
        if chrono::DateTime::parse_from_rfc3339(due_at).is_err() {
            return Err(ApiError::Validation(
                "dueAt must be an RFC 3339 timestamp.".to_string(),
            ));
        }
    }

    if let Some(policy_id) = request.source_policy_id {
        db::policies::load_policy_document(&state.db, org_id, policy_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Policy document not found.".to_string()))?;
    }

    let obligations = db::policies::obligations_for_org(&state.db, org_id, request.source_policy_id)
        .await?
        .into_iter()
        .map(|o| ObligationInput {
            detail: o.detail,
            role_track: o.role_track,
        })
        .collect();

    let draft = state
        .generator
        .generate_campaign_draft(&GenerateDraftInput {
            campaign_name: name.clone(),
            obligations,
            role_tracks: request.role_tracks,
        })
        .await;

    let campaign_id = Uuid::new_v4();
    db::campaigns::insert_campaign(
        &state.db,
        &db::campaigns::NewCampaign {
            id: campaign_id,
            org_id,
            name: &name,
            flow_version: draft.flow_version,
            source_policy_id: request.source_policy_id,
            created_by: auth.user_id,
            due_at: request.due_at.as_deref(),
        },
    )
    .await?;

    for module in &draft.modules {
        let module_id = Uuid::new_v4();
        db::campaigns::insert_module(
            &state.db,
            &db::campaigns::NewModule {
                id: module_id,
                campaign_id,
                role_track: module.role_track,
                title: &module.title,
                summary: &module.summary,
                content_markdown: &module.content_markdown,
                pass_score: module.pass_score as i64,
                estimated_minutes: module.estimated_minutes as i64,
                media_embeds: &module.media_embeds,
                quiz_sync_hash: &module.quiz_sync_hash,
            },
        )
        .await?;

        db::campaigns::insert_quiz_questions(&state.db, module_id, &module.quiz_questions).await?;
    }

    tracing::info!(
        org_id = %org_id,
        campaign_id = %campaign_id,
        modules = draft.modules.len(),
        "Campaign created"
    );

    campaign_detail(State(state), auth, Path((org_id, campaign_id))).await
}

async fn campaign_detail(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((org_id, campaign_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Manager).await?;

    let campaign = db::campaigns::load_campaign(&state.db, org_id, campaign_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found.".to_string()))?;

    let modules = db::campaigns::modules_for_campaign(&state.db, campaign_id).await?;
    let mut module_values = Vec::with_capacity(modules.len());
    for module in &modules {
        module_values.push(module_json(&state, module).await?);
    }

    let mut body = campaign_json(&campaign);
    body["modules"] = Value::Array(module_values);
    Ok(Json(body))
}

/// Idempotent publish. A keyed retry is served the stored response; a
/// fresh request is rate limited and then fanned out.
async fn publish_campaign(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((org_id, campaign_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> ApiResult<Json<PublishResponse>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Admin).await?;

    let key_hash = idempotency_key_from_headers(&headers)?
        .map(|key| hash_idempotency_key(&key));

    if let Some(replayed) = find_idempotent_success::<PublishResponse>(
        &state.db,
        org_id,
        auth.user_id,
        PUBLISH_ACTION,
        key_hash.as_deref(),
        Some(("campaignId", &campaign_id.to_string())),
    )
    .await
    {
        return Ok(Json(replayed));
    }

    let decision = state.rate_limiter.check(org_id, auth.user_id, PUBLISH_ACTION);
    if !decision.allowed {
        return Err(ApiError::RateLimited {
            retry_after_ms: decision.retry_after_ms.unwrap_or(60_000),
        });
    }

    let publisher = CampaignPublisher::new(state.db.clone(), state.email.clone());
    let response = publisher
        .publish(
            org_id,
            auth.user_id,
            campaign_id,
            Uuid::new_v4(),
            key_hash.as_deref(),
        )
        .await?;

    Ok(Json(response))
}

#[derive(Debug, Deserialize, Default)]
struct NudgeRequest {
    #[serde(default)]
    mode: Option<NudgeMode>,
}

async fn send_nudges(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((org_id, campaign_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    body: Option<Json<NudgeRequest>>,
) -> ApiResult<Json<NudgeResponse>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Admin).await?;

    let mode = body
        .and_then(|Json(request)| request.mode)
        .unwrap_or(NudgeMode::AllPending);

    let key_hash = idempotency_key_from_headers(&headers)?
        .map(|key| hash_idempotency_key(&key));

    if let Some(replayed) = find_idempotent_success::<NudgeResponse>(
        &state.db,
        org_id,
        auth.user_id,
        NUDGE_ACTION,
        key_hash.as_deref(),
        Some(("campaignId", &campaign_id.to_string())),
    )
    .await
    {
        return Ok(Json(replayed));
    }

    let decision = state.rate_limiter.check(org_id, auth.user_id, NUDGE_ACTION);
    if !decision.allowed {
        return Err(ApiError::RateLimited {
            retry_after_ms: decision.retry_after_ms.unwrap_or(60_000),
        });
    }

    let sender = NudgeSender::new(state.db.clone(), state.email.clone());
    let response = sender
        .send(
            org_id,
            auth.user_id,
            campaign_id,
            mode,
            Uuid::new_v4(),
            key_hash.as_deref(),
        )
        .await?;

    Ok(Json(response))
}
