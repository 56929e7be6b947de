//! End-to-end workflow tests driven at the service layer
//!
//! Exercises the deterministic generation pipeline and the
//! publish-then-nudge chain against an in-memory database with a
//! recording email delivery, including the exact fallback content shape.

use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use policypilot_common::types::{MediaKind, NudgeMode, OrgRole, RoleTrack};
use policypilot_server::db;
use policypilot_server::services::email::RecordingDelivery;
use policypilot_server::services::generation::{
    GenerateDraftInput, Generator, ObligationInput,
};
use policypilot_server::services::nudges::NudgeSender;
use policypilot_server::services::publish::CampaignPublisher;
use policypilot_server::services::quiz_sync::{compute_quiz_sync_hash, QuizSyncSource};

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    db::init_tables(&pool).await.unwrap();
    pool
}

// =============================================================================
// Deterministic generation
// =============================================================================

#[tokio::test]
async fn fallback_generation_produces_canned_campaign_content() {
    let generator = Generator::Deterministic;

    let draft = generator
        .generate_campaign_draft(&GenerateDraftInput {
            campaign_name: "AI Acceptable Use".to_string(),
            obligations: vec![
                ObligationInput {
                    detail: "Log all production AI usage".to_string(),
                    role_track: RoleTrack::Exec,
                },
                ObligationInput {
                    detail: "Review model output before release".to_string(),
                    role_track: RoleTrack::Builder,
                },
            ],
            role_tracks: vec![RoleTrack::Exec, RoleTrack::Builder],
        })
        .await;

    assert_eq!(draft.flow_version, 2);
    assert_eq!(draft.modules.len(), 2);

    let exec = &draft.modules[0];
    assert_eq!(exec.role_track, RoleTrack::Exec);
    assert_eq!(exec.title, "AI Acceptable Use: Exec Readiness");
    assert_eq!(exec.pass_score, 80);
    assert_eq!(exec.estimated_minutes, 10);
    assert!(exec.content_markdown.contains("Log all production AI usage"));

    let builder = &draft.modules[1];
    assert_eq!(builder.title, "AI Acceptable Use: Builder Readiness");
    assert_eq!(builder.estimated_minutes, 12);

    for module in &draft.modules {
        // One image and one video suggestion, in order
        assert_eq!(module.media_embeds.len(), 2);
        assert_eq!(module.media_embeds[0].kind, MediaKind::Image);
        assert_eq!(module.media_embeds[1].kind, MediaKind::Video);

        // Fixed three-question fallback quiz, four choices each
        assert_eq!(module.quiz_questions.len(), 3);
        for question in &module.quiz_questions {
            assert_eq!(question.choices.len(), 4);
        }

        // The stored hash matches a fresh computation over the content
        let expected = compute_quiz_sync_hash(&QuizSyncSource {
            role_track: module.role_track.as_str(),
            title: &module.title,
            summary: &module.summary,
            content_markdown: &module.content_markdown,
        });
        assert_eq!(module.quiz_sync_hash, expected);
    }
}

// =============================================================================
// Publish then nudge
// =============================================================================

struct Fixture {
    pool: SqlitePool,
    email: Arc<RecordingDelivery>,
    org_id: Uuid,
    admin: Uuid,
    campaign_id: Uuid,
}

async fn seed_fixture(member_count: usize) -> Fixture {
    let pool = memory_pool().await;
    let email = Arc::new(RecordingDelivery::default());

    let org_id = db::orgs::create_organization(&pool, "Acme").await.unwrap();
    let admin = Uuid::new_v4();
    db::orgs::upsert_member(&pool, org_id, admin, "admin@acme.test", OrgRole::Admin)
        .await
        .unwrap();
    for i in 0..member_count {
        db::orgs::upsert_member(
            &pool,
            org_id,
            Uuid::new_v4(),
            &format!("learner{}@acme.test", i),
            OrgRole::Learner,
        )
        .await
        .unwrap();
    }

    // Build campaign content through the real generation pipeline
    let draft = Generator::Deterministic
        .generate_campaign_draft(&GenerateDraftInput {
            campaign_name: "AI Acceptable Use".to_string(),
            obligations: vec![],
            role_tracks: vec![RoleTrack::Exec, RoleTrack::Builder],
        })
        .await;

    let campaign_id = Uuid::new_v4();
    db::campaigns::insert_campaign(
        &pool,
        &db::campaigns::NewCampaign {
            id: campaign_id,
            org_id,
            name: "AI Acceptable Use",
            flow_version: draft.flow_version,
            source_policy_id: None,
            created_by: admin,
            due_at: None,
        },
    )
    .await
    .unwrap();

    for module in &draft.modules {
        let module_id = Uuid::new_v4();
        db::campaigns::insert_module(
            &pool,
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
        .await
        .unwrap();
        db::campaigns::insert_quiz_questions(&pool, module_id, &module.quiz_questions)
            .await
            .unwrap();
    }

    Fixture {
        pool,
        email,
        org_id,
        admin,
        campaign_id,
    }
}

#[tokio::test]
async fn publish_then_nudge_end_to_end() {
    let f = seed_fixture(2).await; // 2 learners + 1 admin = 3 members
    let publisher = CampaignPublisher::new(f.pool.clone(), f.email.clone());

    let published = publisher
        .publish(f.org_id, f.admin, f.campaign_id, Uuid::new_v4(), None)
        .await
        .unwrap();

    // 2 modules x 3 members, one invite per member
    assert!(!published.already_published);
    assert_eq!(published.assignments_created, 6);
    assert_eq!(published.assignments_total, 6);
    assert_eq!(published.emailed_count, 3);

    {
        let sent = f.email.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        for message in sent.iter() {
            assert!(message.subject.contains("AI Acceptable Use"));
            assert!(message.body.contains("/learn/assignments/"));
        }
    }

    // Nudge every pending assignment: 6 outstanding, 6 reminders
    let sender = NudgeSender::new(f.pool.clone(), f.email.clone());
    let nudged = sender
        .send(
            f.org_id,
            f.admin,
            f.campaign_id,
            NudgeMode::AllPending,
            Uuid::new_v4(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(nudged.sent_count, 6);
    assert_eq!(nudged.deduplicated_count, 0);

    // Retrying within the window sends nothing new
    let again = sender
        .send(
            f.org_id,
            f.admin,
            f.campaign_id,
            NudgeMode::AllPending,
            Uuid::new_v4(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(again.sent_count, 0);
    assert_eq!(again.deduplicated_count, 6);
}

#[tokio::test]
async fn publish_writes_a_success_audit_row() {
    let f = seed_fixture(1).await;
    let publisher = CampaignPublisher::new(f.pool.clone(), f.email.clone());

    publisher
        .publish(f.org_id, f.admin, f.campaign_id, Uuid::new_v4(), Some("keyhash"))
        .await
        .unwrap();

    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT metadata_json, status_code FROM request_audit_logs WHERE org_id = ? AND action = 'campaign_publish'",
    )
    .bind(f.org_id.to_string())
    .fetch_all(&f.pool)
    .await
    .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1, 200);

    let metadata: serde_json::Value = serde_json::from_str(&rows[0].0).unwrap();
    assert_eq!(metadata["campaignId"], f.campaign_id.to_string());
    assert_eq!(metadata["idempotencyKeyHash"], "keyhash");
    assert_eq!(metadata["response"]["alreadyPublished"], false);
}
