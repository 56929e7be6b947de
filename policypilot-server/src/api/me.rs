//! Caller-scoped endpoints: org memberships, owner bootstrap, and the
//! learner assignment views

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use policypilot_common::types::{AssignmentState, MediaStatus, OrgRole};

use crate::auth::AuthContext;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/me/bootstrap-owner", post(bootstrap_owner))
        .route("/api/me/org-memberships", get(my_orgs))
        .route("/api/me/assignments", get(my_assignments))
        .route("/api/me/assignments/:assignment_id", get(assignment_detail))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BootstrapRequest {
    org_name: Option<String>,
}

fn default_org_name(email: &str) -> String {
    let prefix = email.split('@').next().map(str::trim).unwrap_or("");
    let prefix = if prefix.is_empty() { "New User" } else { prefix };
    let name = format!("{}'s Workspace", prefix);
    name.chars().take(80).collect()
}

/// Dev-only: ensure the caller has an owner seat somewhere. Already a
/// member: reports the existing memberships. Otherwise joins the oldest
/// org as owner, creating one when none exist yet.
async fn bootstrap_owner(
    State(state): State<AppState>,
    auth: AuthContext,
    body: Option<Json<BootstrapRequest>>,
) -> ApiResult<Json<Value>> {
    if !state.config.allow_dev_bootstrap {
        return Err(ApiError::Auth(
            "Bootstrap flow is disabled in this environment.".to_string(),
        ));
    }

    let request = body.map(|Json(r)| r).unwrap_or_default();
    if let Some(name) = request.org_name.as_deref() {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.chars().count() > 120 {
            return Err(ApiError::Validation(
                "Organization name must be 1-120 characters.".to_string(),
            ));
        }
    }

    let existing = db::orgs::memberships_for_user(&state.db, auth.user_id).await?;
    if !existing.is_empty() {
        return Ok(Json(json!({
            "ok": true,
            "created": false,
            "memberships": existing,
        })));
    }

    let email = if auth.email.is_empty() {
        format!("{}@local.dev", auth.user_id)
    } else {
        auth.email.clone()
    };

    let (org_id, org_name, created_organization) =
        match db::orgs::oldest_organization(&state.db).await? {
            Some((org_id, org_name)) => (org_id, org_name, false),
            None => {
                let name = request
                    .org_name
                    .as_deref()
                    .map(|n| n.trim().to_string())
                    .unwrap_or_else(|| default_org_name(&email));
                let org_id = db::orgs::create_organization(&state.db, &name).await?;
                (org_id, name, true)
            }
        };

    db::orgs::upsert_member(&state.db, org_id, auth.user_id, &email, OrgRole::Owner).await?;

    tracing::info!(
        org_id = %org_id,
        user_id = %auth.user_id,
        created_organization,
        "Bootstrapped owner membership"
    );

    db::audit::write_request_audit_log_best_effort(
        &state.db,
        &db::audit::AuditLogEntry {
            request_id: Uuid::new_v4(),
            route: "/api/me/bootstrap-owner",
            action: "dev_bootstrap_owner",
            status_code: 200,
            org_id,
            user_id: auth.user_id,
            metadata: json!({
                "created": true,
                "createdOrganization": created_organization,
                "assignedRole": "owner",
            }),
        },
    )
    .await;

    Ok(Json(json!({
        "ok": true,
        "created": true,
        "createdOrganization": created_organization,
        "membership": {
            "orgId": org_id,
            "orgName": org_name,
            "role": "owner",
        },
    })))
}

async fn my_orgs(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<Value>> {
    let memberships = db::orgs::memberships_for_user(&state.db, auth.user_id).await?;
    Ok(Json(json!({ "memberships": memberships })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentSummary {
    id: Uuid,
    campaign_id: Uuid,
    campaign_name: String,
    module_id: Uuid,
    module_title: String,
    role_track: String,
    state: AssignmentState,
    due_at: Option<String>,
    assigned_at: String,
    estimated_minutes: i64,
}

async fn my_assignments(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<Value>> {
    let items = db::assignments::list_for_user(&state.db, auth.user_id).await?;

    let assignments: Vec<AssignmentSummary> = items
        .into_iter()
        .map(|item| AssignmentSummary {
            id: item.id,
            campaign_id: item.campaign_id,
            campaign_name: item.campaign_name,
            module_id: item.module_id,
            module_title: item.module_title,
            role_track: item.role_track,
            state: item.state,
            due_at: item.due_at,
            assigned_at: item.assigned_at,
            estimated_minutes: item.estimated_minutes,
        })
        .collect();

    Ok(Json(json!({ "assignments": assignments })))
}

/// Quiz question as shown to a learner: no correct index, no explanation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LearnerQuizQuestion {
    prompt: String,
    choices: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LearnerMediaEmbed {
    id: Uuid,
    kind: String,
    title: String,
    caption: String,
    status: MediaStatus,
    order: u32,
    asset_url: Option<String>,
}

/// Full module content for one assignment. First view moves the
/// assignment from assigned to in_progress.
async fn assignment_detail(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(assignment_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let assignment = db::assignments::load_for_user(&state.db, assignment_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assignment not found.".to_string()))?;

    let started = db::assignments::mark_in_progress(&state.db, assignment_id).await?;
    let current_state = if started {
        AssignmentState::InProgress
    } else {
        assignment.state
    };

    let campaign = db::campaigns::load_campaign(&state.db, assignment.org_id, assignment.campaign_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found.".to_string()))?;

    let module = db::campaigns::load_module(&state.db, assignment.campaign_id, assignment.module_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Module not found.".to_string()))?;

    // Sign every attached asset in one pass
    let attached_paths: Vec<String> = module
        .media_embeds
        .iter()
        .filter(|e| e.status == MediaStatus::Attached)
        .filter_map(|e| e.asset_path.clone())
        .collect();
    let mut signed = state
        .storage
        .create_signed_urls(&attached_paths, state.config.signed_url_ttl_seconds)
        .await
        .map_err(ApiError::from)?
        .into_iter();

    let media_embeds: Vec<LearnerMediaEmbed> = module
        .media_embeds
        .iter()
        .map(|embed| {
            let asset_url = if embed.status == MediaStatus::Attached && embed.asset_path.is_some() {
                signed.next().flatten()
            } else {
                None
            };
            LearnerMediaEmbed {
                id: embed.id,
                kind: embed.kind.as_str().to_string(),
                title: embed.title.clone(),
                caption: embed.caption.clone(),
                status: embed.status,
                order: embed.order,
                asset_url,
            }
        })
        .collect();

    let questions = db::campaigns::quiz_questions_for_module(&state.db, assignment.module_id).await?;
    let quiz_questions: Vec<LearnerQuizQuestion> = questions
        .into_iter()
        .map(|q| LearnerQuizQuestion {
            prompt: q.prompt,
            choices: q.choices,
        })
        .collect();

    Ok(Json(json!({
        "id": assignment.id,
        "state": current_state,
        "dueAt": assignment.due_at,
        "assignedAt": assignment.assigned_at,
        "campaign": {
            "id": campaign.id,
            "name": campaign.name,
        },
        "module": {
            "id": module.id,
            "roleTrack": module.role_track,
            "title": module.title,
            "summary": module.summary,
            "contentMarkdown": module.content_markdown,
            "passScore": module.pass_score,
            "estimatedMinutes": module.estimated_minutes,
        },
        "mediaEmbeds": media_embeds,
        "quizQuestions": quiz_questions,
    })))
}
