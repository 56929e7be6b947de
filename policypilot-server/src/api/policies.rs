//! Policy document upload and obligation registration

use axum::extract::{Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use policypilot_common::types::{OrgRole, RoleTrack};

use crate::auth::{require_org_role, AuthContext};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::services::files::normalize_policy_upload_file;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/orgs/:org_id/policies",
            get(list_policies).post(upload_policy),
        )
        .route(
            "/api/orgs/:org_id/policies/:policy_id/obligations",
            post(add_obligations),
        )
}

fn policy_json(doc: &db::policies::PolicyDocument) -> Value {
    json!({
        "id": doc.id,
        "title": doc.title,
        "fileName": doc.file_name,
        "mimeType": doc.mime_type,
        "sizeBytes": doc.size_bytes,
        "parseStatus": doc.parse_status.as_str(),
        "createdAt": doc.created_at,
    })
}

async fn list_policies(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Manager).await?;

    let documents = db::policies::list_policy_documents(&state.db, org_id).await?;
    let policies: Vec<Value> = documents.iter().map(policy_json).collect();
    Ok(Json(json!({ "policies": policies })))
}

/// Multipart upload: a `title` text field and a `file` part. The file is
/// validated (extension/MIME allow-list, size ceiling), stored under a
/// normalized path, and recorded with parse status pending.
async fn upload_policy(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(org_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Admin).await?;

    let mut title: Option<String> = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?
    {
        match field.name() {
            Some("title") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?;
                title = Some(value);
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .ok_or_else(|| {
                        ApiError::Validation("Uploaded file must include a name.".to_string())
                    })?
                    .to_string();
                let mime_type = field
                    .content_type()
                    .ok_or_else(|| {
                        ApiError::Validation("Uploaded file must declare a MIME type.".to_string())
                    })?
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?;
                file = Some((file_name, mime_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && t.chars().count() <= 160)
        .ok_or_else(|| ApiError::Validation("Title must be 1-160 characters.".to_string()))?;
    let (file_name, mime_type, bytes) =
        file.ok_or_else(|| ApiError::Validation("A file is required.".to_string()))?;

    if bytes.is_empty() {
        return Err(ApiError::Validation("Uploaded file is empty.".to_string()));
    }
    if bytes.len() as u64 > state.config.max_upload_bytes() {
        return Err(ApiError::Validation(format!(
            "File exceeds the {} MB upload limit.",
            state.config.max_upload_mb
        )));
    }

    let policy_id = Uuid::new_v4();
    let normalized = normalize_policy_upload_file(org_id, policy_id, &file_name, &mime_type)?;

    state
        .storage
        .upload(&normalized.file_path, &bytes, &mime_type)
        .await?;

    db::policies::insert_policy_document(
        &state.db,
        &db::policies::NewPolicyDocument {
            id: policy_id,
            org_id,
            title: &title,
            file_path: &normalized.file_path,
            file_name: &normalized.safe_file_name,
            mime_type: &mime_type,
            size_bytes: bytes.len() as i64,
            uploaded_by: auth.user_id,
        },
    )
    .await?;

    tracing::info!(
        org_id = %org_id,
        policy_id = %policy_id,
        file = %normalized.safe_file_name,
        "Policy document uploaded"
    );

    let doc = db::policies::load_policy_document(&state.db, org_id, policy_id)
        .await?
        .ok_or_else(|| ApiError::Internal("Policy document vanished after insert.".to_string()))?;

    Ok(Json(policy_json(&doc)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObligationInput {
    detail: String,
    role_track: RoleTrack,
}

#[derive(Debug, Deserialize)]
struct AddObligationsRequest {
    obligations: Vec<ObligationInput>,
}

/// Register extracted obligations against a policy. The document parser
/// runs out of band; this is its write-back endpoint.
async fn add_obligations(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((org_id, policy_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<AddObligationsRequest>,
) -> ApiResult<Json<Value>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Admin).await?;

    db::policies::load_policy_document(&state.db, org_id, policy_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Policy document not found.".to_string()))?;

    if request.obligations.is_empty() {
        return Err(ApiError::Validation(
            "At least one obligation is required.".to_string(),
        ));
    }

    let mut created = 0u64;
    for obligation in &request.obligations {
        let detail = obligation.detail.trim();
        if detail.is_empty() || detail.chars().count() > 600 {
            return Err(ApiError::Validation(
                "Each obligation must be 1-600 characters.".to_string(),
            ));
        }
        db::policies::insert_obligation(&state.db, org_id, policy_id, detail, obligation.role_track)
            .await?;
        created += 1;
    }

    Ok(Json(json!({ "ok": true, "created": created })))
}
