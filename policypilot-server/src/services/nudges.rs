//! Reminder (nudge) workflow
//!
//! Re-engages members with outstanding assignments in a campaign. A
//! 24-hour per-assignment window bounds reminder volume: an
//! assignment reminded within the window is silently skipped and counted
//! as deduplicated.

use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use policypilot_common::types::{AssignmentState, NudgeMode};

use crate::db;
use crate::db::audit::AuditLogEntry;
use crate::error::{ApiError, ApiResult};
use crate::models::NudgeResponse;
use crate::services::email::{send_reminder_emails, AssignmentRecipient, EmailDelivery};
use crate::services::idempotency::with_idempotency_metadata;

pub const NUDGE_ACTION: &str = "nudge_send";

const DEDUP_WINDOW_HOURS: i64 = 24;

fn states_for_mode(mode: NudgeMode) -> &'static [AssignmentState] {
    match mode {
        NudgeMode::AllPending => &[
            AssignmentState::Assigned,
            AssignmentState::InProgress,
            AssignmentState::Overdue,
        ],
        NudgeMode::OverdueOnly => &[AssignmentState::Overdue],
    }
}

pub struct NudgeSender {
    db: SqlitePool,
    email: Arc<dyn EmailDelivery>,
}

impl NudgeSender {
    pub fn new(db: SqlitePool, email: Arc<dyn EmailDelivery>) -> Self {
        Self { db, email }
    }

    pub async fn send(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        campaign_id: Uuid,
        mode: NudgeMode,
        request_id: Uuid,
        idempotency_key_hash: Option<&str>,
    ) -> ApiResult<NudgeResponse> {
        db::campaigns::load_campaign(&self.db, org_id, campaign_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Campaign not found.".to_string()))?;

        let pending =
            db::assignments::pending_for_campaign(&self.db, campaign_id, states_for_mode(mode))
                .await?;

        let since = (Utc::now() - Duration::hours(DEDUP_WINDOW_HOURS)).to_rfc3339();
        let recently_notified =
            db::notifications::recently_notified(&self.db, campaign_id, &since).await?;

        let mut targets: Vec<AssignmentRecipient> = Vec::new();
        let mut target_ids: Vec<Uuid> = Vec::new();
        let mut deduplicated = 0u64;

        for assignment in pending {
            if assignment.email.trim().is_empty() {
                continue;
            }
            if recently_notified.contains(&assignment.assignment_id) {
                deduplicated += 1;
                continue;
            }
            target_ids.push(assignment.assignment_id);
            targets.push(AssignmentRecipient {
                email: assignment.email,
                assignment_id: assignment.assignment_id,
                campaign_name: assignment.campaign_name,
            });
        }

        let delivered = if targets.is_empty() {
            0
        } else {
            send_reminder_emails(self.email.as_ref(), &targets, request_id).await
        };

        // Record the send only when delivery was accepted, so a relay
        // outage does not burn the dedup window
        if delivered > 0 {
            db::notifications::record_reminders(&self.db, campaign_id, &target_ids).await?;
        }

        let response = NudgeResponse {
            ok: true,
            sent_count: delivered as u64,
            mode,
            deduplicated_count: deduplicated,
        };

        let metadata = with_idempotency_metadata(
            json!({
                "campaignId": campaign_id.to_string(),
                "mode": mode.as_str(),
                "response": response,
            }),
            idempotency_key_hash,
        );

        db::audit::write_request_audit_log_best_effort(
            &self.db,
            &AuditLogEntry {
                request_id,
                route: "/api/orgs/:org_id/campaigns/:campaign_id/nudges/send",
                action: NUDGE_ACTION,
                status_code: 200,
                org_id,
                user_id,
                metadata,
            },
        )
        .await;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::RecordingDelivery;
    use policypilot_common::types::{OrgRole, RoleTrack};

    async fn seed_published_campaign(pool: &SqlitePool, member_count: usize) -> (Uuid, Uuid) {
        let org_id = db::orgs::create_organization(pool, "Acme").await.unwrap();
        let mut user_ids = Vec::new();
        for i in 0..member_count {
            let user_id = Uuid::new_v4();
            db::orgs::upsert_member(
                pool,
                org_id,
                user_id,
                &format!("member{}@acme.test", i),
                OrgRole::Learner,
            )
            .await
            .unwrap();
            user_ids.push(user_id);
        }

        let campaign_id = Uuid::new_v4();
        db::campaigns::insert_campaign(
            pool,
            &db::campaigns::NewCampaign {
                id: campaign_id,
                org_id,
                name: "AI Acceptable Use",
                flow_version: 2,
                source_policy_id: None,
                created_by: Uuid::new_v4(),
                due_at: None,
            },
        )
        .await
        .unwrap();

        let module_id = Uuid::new_v4();
        db::campaigns::insert_module(
            pool,
            &db::campaigns::NewModule {
                id: module_id,
                campaign_id,
                role_track: RoleTrack::General,
                title: "Module",
                summary: "Summary",
                content_markdown: "Body",
                pass_score: 80,
                estimated_minutes: 10,
                media_embeds: &[],
                quiz_sync_hash: "hash",
            },
        )
        .await
        .unwrap();

        db::assignments::upsert_assignments(pool, org_id, campaign_id, &[module_id], &user_ids, None)
            .await
            .unwrap();
        db::campaigns::mark_published_if_draft(pool, org_id, campaign_id)
            .await
            .unwrap();

        (org_id, campaign_id)
    }

    #[tokio::test]
    async fn unassigned_draft_campaign_sends_nothing() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        db::init_tables(&pool).await.unwrap();
        let email = Arc::new(RecordingDelivery::default());
        let sender = NudgeSender::new(pool.clone(), email.clone());

        let org_id = db::orgs::create_organization(&pool, "Acme").await.unwrap();

        // Unknown campaign is still a 404
        let missing = sender
            .send(
                org_id,
                Uuid::new_v4(),
                Uuid::new_v4(),
                NudgeMode::AllPending,
                Uuid::new_v4(),
                None,
            )
            .await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));

        // A draft has no assignments yet, so the send is an empty no-op
        let campaign_id = Uuid::new_v4();
        db::campaigns::insert_campaign(
            &pool,
            &db::campaigns::NewCampaign {
                id: campaign_id,
                org_id,
                name: "Draft",
                flow_version: 2,
                source_policy_id: None,
                created_by: Uuid::new_v4(),
                due_at: None,
            },
        )
        .await
        .unwrap();

        let response = sender
            .send(
                org_id,
                Uuid::new_v4(),
                campaign_id,
                NudgeMode::AllPending,
                Uuid::new_v4(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(response.sent_count, 0);
        assert_eq!(response.deduplicated_count, 0);
        assert!(email.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_send_within_window_is_fully_deduplicated() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        db::init_tables(&pool).await.unwrap();
        let email = Arc::new(RecordingDelivery::default());
        let sender = NudgeSender::new(pool.clone(), email.clone());

        let (org_id, campaign_id) = seed_published_campaign(&pool, 3).await;
        let admin = Uuid::new_v4();

        let first = sender
            .send(org_id, admin, campaign_id, NudgeMode::AllPending, Uuid::new_v4(), None)
            .await
            .unwrap();
        assert_eq!(first.sent_count, 3);
        assert_eq!(first.deduplicated_count, 0);

        let second = sender
            .send(org_id, admin, campaign_id, NudgeMode::AllPending, Uuid::new_v4(), None)
            .await
            .unwrap();
        assert_eq!(second.sent_count, 0);
        assert_eq!(second.deduplicated_count, 3);

        assert_eq!(email.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn overdue_only_mode_skips_fresh_assignments() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        db::init_tables(&pool).await.unwrap();
        let sender = NudgeSender::new(pool.clone(), Arc::new(RecordingDelivery::default()));

        let (org_id, campaign_id) = seed_published_campaign(&pool, 2).await;

        let response = sender
            .send(
                org_id,
                Uuid::new_v4(),
                campaign_id,
                NudgeMode::OverdueOnly,
                Uuid::new_v4(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(response.sent_count, 0);
        assert_eq!(response.deduplicated_count, 0);
        assert_eq!(response.mode, NudgeMode::OverdueOnly);
    }
}
