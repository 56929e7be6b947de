//! Module media upload: attaching an asset to a suggested embed slot

use axum::extract::{Multipart, Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use uuid::Uuid;

use policypilot_common::types::{CampaignStatus, MediaStatus, OrgRole};

use crate::auth::{require_org_role, AuthContext};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::services::files::normalize_module_media_upload_file;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/orgs/:org_id/campaigns/:campaign_id/modules/:module_id/media/:embed_id",
        post(upload_module_media),
    )
}

/// Attach an uploaded asset to one media embed slot. Only draft campaigns
/// accept media; the embed's kind must match the uploaded file.
async fn upload_module_media(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((org_id, campaign_id, module_id, embed_id)): Path<(Uuid, Uuid, Uuid, Uuid)>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    require_org_role(&state.db, org_id, auth.user_id, OrgRole::Admin).await?;

    let campaign = db::campaigns::load_campaign(&state.db, org_id, campaign_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found.".to_string()))?;

    if campaign.status != CampaignStatus::Draft {
        return Err(ApiError::Conflict(
            "Media can only be attached while the campaign is in draft.".to_string(),
        ));
    }

    let module = db::campaigns::load_module(&state.db, campaign_id, module_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Module not found.".to_string()))?;

    let embed_index = module
        .media_embeds
        .iter()
        .position(|e| e.id == embed_id)
        .ok_or_else(|| ApiError::NotFound("Media embed not found.".to_string()))?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .ok_or_else(|| ApiError::Validation("Uploaded file must include a name.".to_string()))?
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

    let normalized = normalize_module_media_upload_file(
        org_id,
        campaign_id,
        module_id,
        embed_id,
        &file_name,
        &mime_type,
    )?;

    if normalized.kind != module.media_embeds[embed_index].kind {
        return Err(ApiError::Validation(format!(
            "This embed slot expects {} content.",
            module.media_embeds[embed_index].kind.as_str()
        )));
    }

    state
        .storage
        .upload(&normalized.file_path, &bytes, &normalized.mime_type)
        .await?;

    let mut media_embeds = module.media_embeds;
    {
        let embed = &mut media_embeds[embed_index];
        embed.asset_path = Some(normalized.file_path.clone());
        embed.mime_type = Some(normalized.mime_type.clone());
        embed.status = MediaStatus::Attached;
    }

    db::campaigns::update_module_media_embeds(&state.db, module_id, &media_embeds).await?;

    tracing::info!(
        campaign_id = %campaign_id,
        module_id = %module_id,
        embed_id = %embed_id,
        file = %normalized.safe_file_name,
        "Module media attached"
    );

    db::audit::write_request_audit_log_best_effort(
        &state.db,
        &db::audit::AuditLogEntry {
            request_id: Uuid::new_v4(),
            route: "/api/orgs/:org_id/campaigns/:campaign_id/modules/:module_id/media/:embed_id",
            action: "module_media_upload",
            status_code: 200,
            org_id,
            user_id: auth.user_id,
            metadata: json!({
                "campaignId": campaign_id.to_string(),
                "moduleId": module_id.to_string(),
                "embedId": embed_id.to_string(),
                "fileName": normalized.safe_file_name,
            }),
        },
    )
    .await;

    Ok(Json(json!({
        "ok": true,
        "embed": media_embeds[embed_index],
    })))
}
