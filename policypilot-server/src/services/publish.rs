//! Campaign publish workflow
//!
//! Fan-out of a draft campaign to every org member: assignment creation,
//! the one-way draft → published transition, and invite email. The whole
//! flow is safe to retry: assignment inserts skip existing rows, the
//! status flip is a compare-and-swap, and only the CAS winner sends email.

use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use policypilot_common::types::CampaignStatus;

use crate::db;
use crate::db::audit::AuditLogEntry;
use crate::error::{ApiError, ApiResult};
use crate::models::PublishResponse;
use crate::services::email::{send_campaign_invites, AssignmentRecipient, EmailDelivery};
use crate::services::idempotency::with_idempotency_metadata;

pub const PUBLISH_ACTION: &str = "campaign_publish";

pub struct CampaignPublisher {
    db: SqlitePool,
    email: Arc<dyn EmailDelivery>,
}

impl CampaignPublisher {
    pub fn new(db: SqlitePool, email: Arc<dyn EmailDelivery>) -> Self {
        Self { db, email }
    }

    /// Publish one campaign. `idempotency_key_hash` is recorded in the
    /// audit row so a keyed retry can be replayed by the handler; replay
    /// lookup itself happens before this runs.
    pub async fn publish(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        campaign_id: Uuid,
        request_id: Uuid,
        idempotency_key_hash: Option<&str>,
    ) -> ApiResult<PublishResponse> {
        let campaign = db::campaigns::load_campaign(&self.db, org_id, campaign_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Campaign not found.".to_string()))?;

        if campaign.status == CampaignStatus::Archived {
            return Err(ApiError::Conflict(
                "Archived campaigns cannot be published.".to_string(),
            ));
        }

        let modules = db::campaigns::modules_for_campaign(&self.db, campaign_id).await?;
        if modules.is_empty() {
            return Err(ApiError::Conflict(
                "Campaign has no modules to publish.".to_string(),
            ));
        }

        let members = db::orgs::members_of_org(&self.db, org_id).await?;
        if members.is_empty() {
            return Err(ApiError::Conflict(
                "Organization has no members to assign.".to_string(),
            ));
        }

        if campaign.status == CampaignStatus::Published {
            let total = db::assignments::count_for_campaign(&self.db, campaign_id).await?;
            let response = PublishResponse {
                ok: true,
                campaign_id,
                already_published: true,
                assignments_created: 0,
                assignments_total: total as u64,
                emailed_count: 0,
            };
            self.write_audit(org_id, user_id, campaign_id, request_id, idempotency_key_hash, &response)
                .await;
            return Ok(response);
        }

        let module_ids: Vec<Uuid> = modules.iter().map(|m| m.id).collect();
        let user_ids: Vec<Uuid> = members.iter().map(|m| m.user_id).collect();

        let created = db::assignments::upsert_assignments(
            &self.db,
            org_id,
            campaign_id,
            &module_ids,
            &user_ids,
            campaign.due_at.as_deref(),
        )
        .await?;
        let total = db::assignments::count_for_campaign(&self.db, campaign_id).await? as u64;

        let won_publish = db::campaigns::mark_published_if_draft(&self.db, org_id, campaign_id).await?;

        let response = if won_publish {
            let targets: Vec<AssignmentRecipient> =
                db::assignments::first_assignment_per_user(&self.db, campaign_id)
                    .await?
                    .into_iter()
                    .filter(|t| !t.email.trim().is_empty())
                    .map(|t| AssignmentRecipient {
                        email: t.email,
                        assignment_id: t.assignment_id,
                        campaign_name: t.campaign_name,
                    })
                    .collect();

            let emailed = send_campaign_invites(self.email.as_ref(), &targets, request_id).await;

            tracing::info!(
                campaign_id = %campaign_id,
                assignments_created = created,
                assignments_total = total,
                emailed = emailed,
                "Campaign published"
            );

            PublishResponse {
                ok: true,
                campaign_id,
                already_published: false,
                assignments_created: created,
                assignments_total: total,
                emailed_count: emailed as u64,
            }
        } else {
            // A concurrent publish won the CAS; report its outcome, not
            // this caller's inserts
            PublishResponse {
                ok: true,
                campaign_id,
                already_published: true,
                assignments_created: 0,
                assignments_total: total,
                emailed_count: 0,
            }
        };

        self.write_audit(org_id, user_id, campaign_id, request_id, idempotency_key_hash, &response)
            .await;
        Ok(response)
    }

    async fn write_audit(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        campaign_id: Uuid,
        request_id: Uuid,
        idempotency_key_hash: Option<&str>,
        response: &PublishResponse,
    ) {
        let metadata = with_idempotency_metadata(
            json!({
                "campaignId": campaign_id.to_string(),
                "response": response,
            }),
            idempotency_key_hash,
        );

        db::audit::write_request_audit_log_best_effort(
            &self.db,
            &AuditLogEntry {
                request_id,
                route: "/api/orgs/:org_id/campaigns/:campaign_id/publish",
                action: PUBLISH_ACTION,
                status_code: 200,
                org_id,
                user_id,
                metadata,
            },
        )
        .await;
    }
}
