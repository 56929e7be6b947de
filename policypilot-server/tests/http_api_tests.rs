//! Integration tests for the policypilot-server HTTP API
//!
//! Drives the full router with tower::oneshot against an in-memory SQLite
//! database, the deterministic generator, and a recording email delivery.
//! Covers identity/role enforcement, campaign lifecycle, idempotent
//! publish, reminder deduplication, uploads, and the learner views.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use policypilot_common::config::ServerConfig;
use policypilot_server::services::email::RecordingDelivery;
use policypilot_server::services::generation::Generator;
use policypilot_server::services::storage::LocalObjectStorage;
use policypilot_server::{build_router, AppState};

struct TestContext {
    app: axum::Router,
    email: Arc<RecordingDelivery>,
    _storage_dir: tempfile::TempDir,
}

async fn setup() -> TestContext {
    let db = SqlitePool::connect(":memory:").await.unwrap();
    policypilot_server::db::init_tables(&db).await.unwrap();

    let storage_dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalObjectStorage::new(storage_dir.path().to_path_buf()));

    let email = Arc::new(RecordingDelivery::default());

    let mut config = ServerConfig::default();
    config.allow_dev_bootstrap = true;

    let state = AppState::new(db, storage, email.clone(), Generator::Deterministic, config);

    TestContext {
        app: build_router(state),
        email,
        _storage_dir: storage_dir,
    }
}

fn request(method: &str, uri: &str, user_id: Uuid, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user_id.to_string())
        .header("x-user-email", format!("user-{}@test.example", user_id));

    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(ctx: &TestContext, request: Request<Body>) -> (StatusCode, Value) {
    let response = ctx.app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = extract_json(response.into_body()).await;
    (status, body)
}

/// Bootstrap an org owned by `owner` and return its id
async fn bootstrap_org(ctx: &TestContext, owner: Uuid) -> Uuid {
    let (status, body) = send(
        ctx,
        request(
            "POST",
            "/api/me/bootstrap-owner",
            owner,
            Some(json!({"orgName": "Acme Corp"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], true);
    Uuid::parse_str(body["membership"]["orgId"].as_str().unwrap()).unwrap()
}

/// Create a draft campaign and return its id
async fn create_campaign(ctx: &TestContext, owner: Uuid, org_id: Uuid, tracks: Value) -> Value {
    let (status, body) = send(
        ctx,
        request(
            "POST",
            &format!("/api/orgs/{}/campaigns", org_id),
            owner,
            Some(json!({"name": "AI Acceptable Use", "roleTracks": tracks})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create campaign failed: {}", body);
    body
}

// =============================================================================
// Health and identity
// =============================================================================

#[tokio::test]
async fn health_endpoint_requires_no_identity() {
    let ctx = setup().await;

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "policypilot-server");
}

#[tokio::test]
async fn missing_identity_header_is_rejected() {
    let ctx = setup().await;

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me/org-memberships")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "AUTH_ERROR");
}

// =============================================================================
// Bootstrap and memberships
// =============================================================================

#[tokio::test]
async fn bootstrap_then_list_memberships() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let (status, body) = send(&ctx, request("GET", "/api/me/org-memberships", owner, None)).await;
    assert_eq!(status, StatusCode::OK);

    let memberships = body["memberships"].as_array().unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0]["orgId"], org_id.to_string());
    assert_eq!(memberships[0]["role"], "owner");

    // A second bootstrap is a no-op reporting the existing membership
    let (status, body) = send(
        &ctx,
        request("POST", "/api/me/bootstrap-owner", owner, Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
    assert_eq!(body["memberships"].as_array().unwrap().len(), 1);

    // A new user with no org of their own joins the oldest existing org
    let second = Uuid::new_v4();
    let (status, body) = send(
        &ctx,
        request("POST", "/api/me/bootstrap-owner", second, Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], true);
    assert_eq!(body["createdOrganization"], false);
    assert_eq!(body["membership"]["orgId"], org_id.to_string());
}

// =============================================================================
// Campaign creation (deterministic generator)
// =============================================================================

#[tokio::test]
async fn campaign_creation_generates_requested_tracks() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let body = create_campaign(&ctx, owner, org_id, json!(["builder", "exec"])).await;

    assert_eq!(body["status"], "draft");
    assert_eq!(body["flowVersion"], 2);

    let modules = body["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 2);
    // Canonical order regardless of request order
    assert_eq!(modules[0]["roleTrack"], "exec");
    assert_eq!(modules[1]["roleTrack"], "builder");

    for module in modules {
        assert_eq!(module["passScore"], 80);
        assert!(module["questionCount"].as_u64().unwrap() >= 3);
        assert!(!module["mediaEmbeds"].as_array().unwrap().is_empty());
        assert_eq!(module["quizSyncHash"].as_str().unwrap().len(), 64);
    }
}

#[tokio::test]
async fn campaign_creation_requires_admin() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    // A complete outsider sees a 404, not a 403
    let (status, body) = send(
        &ctx,
        request(
            "POST",
            &format!("/api/orgs/{}/campaigns", org_id),
            Uuid::new_v4(),
            Some(json!({"name": "Not allowed", "roleTracks": []})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn campaign_name_is_validated_before_generation() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let (status, body) = send(
        &ctx,
        request(
            "POST",
            &format!("/api/orgs/{}/campaigns", org_id),
            owner,
            Some(json!({"name": "ab", "roleTracks": []})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn campaign_due_date_is_validated_and_inherited_by_assignments() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;
    let uri = format!("/api/orgs/{}/campaigns", org_id);

    let (status, body) = send(
        &ctx,
        request(
            "POST",
            &uri,
            owner,
            Some(json!({"name": "Due soon", "roleTracks": [], "dueAt": "next tuesday"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let due_at = "2026-09-30T00:00:00+00:00";
    let (status, campaign) = send(
        &ctx,
        request(
            "POST",
            &uri,
            owner,
            Some(json!({"name": "Due soon", "roleTracks": ["general"], "dueAt": due_at})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", campaign);
    assert_eq!(campaign["dueAt"], due_at);

    let campaign_id = campaign["id"].as_str().unwrap().to_string();
    let publish_uri = format!("/api/orgs/{}/campaigns/{}/publish", org_id, campaign_id);
    let (status, _body) = send(&ctx, request("POST", &publish_uri, owner, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, list) = send(&ctx, request("GET", "/api/me/assignments", owner, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["assignments"][0]["dueAt"], due_at);
}

// =============================================================================
// Publish workflow
// =============================================================================

#[tokio::test]
async fn publish_fans_out_and_keyed_retry_replays() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let campaign = create_campaign(&ctx, owner, org_id, json!(["exec", "builder"])).await;
    let campaign_id = campaign["id"].as_str().unwrap().to_string();

    let publish_uri = format!("/api/orgs/{}/campaigns/{}/publish", org_id, campaign_id);
    let keyed = |key: &str| {
        Request::builder()
            .method("POST")
            .uri(&publish_uri)
            .header("x-user-id", owner.to_string())
            .header("x-user-email", format!("user-{}@test.example", owner))
            .header("idempotency-key", key)
            .body(Body::empty())
            .unwrap()
    };

    // Sole member is the owner: 2 modules x 1 member
    let (status, first) = send(&ctx, keyed("publish-1")).await;
    assert_eq!(status, StatusCode::OK, "publish failed: {}", first);
    assert_eq!(first["ok"], true);
    assert_eq!(first["alreadyPublished"], false);
    assert_eq!(first["assignmentsCreated"], 2);
    assert_eq!(first["assignmentsTotal"], 2);
    assert_eq!(first["emailedCount"], 1);
    assert_eq!(ctx.email.sent.lock().unwrap().len(), 1);

    // Same key: the stored response comes back verbatim, no new email
    let (status, replay) = send(&ctx, keyed("publish-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay, first);
    assert_eq!(ctx.email.sent.lock().unwrap().len(), 1);

    // A fresh key against the now-published campaign short-circuits
    let (status, second) = send(&ctx, keyed("publish-2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["alreadyPublished"], true);
    assert_eq!(second["assignmentsCreated"], 0);
    assert_eq!(second["emailedCount"], 0);
}

#[tokio::test]
async fn publish_is_rate_limited_per_actor() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let campaign = create_campaign(&ctx, owner, org_id, json!(["general"])).await;
    let campaign_id = campaign["id"].as_str().unwrap().to_string();
    let publish_uri = format!("/api/orgs/{}/campaigns/{}/publish", org_id, campaign_id);

    // Default quota is 5 per minute per (org, user, action); unkeyed
    // requests always hit the workflow
    let mut last_status = StatusCode::OK;
    let mut last_body = Value::Null;
    for _ in 0..6 {
        let (status, body) = send(&ctx, request("POST", &publish_uri, owner, None)).await;
        last_status = status;
        last_body = body;
    }

    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(last_body["error"]["code"], "RATE_LIMITED");
    assert!(last_body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Rate limit reached."));
}

// =============================================================================
// Nudges
// =============================================================================

#[tokio::test]
async fn nudges_send_once_then_deduplicate() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let campaign = create_campaign(&ctx, owner, org_id, json!(["general"])).await;
    let campaign_id = campaign["id"].as_str().unwrap().to_string();

    let publish_uri = format!("/api/orgs/{}/campaigns/{}/publish", org_id, campaign_id);
    let (status, _body) = send(&ctx, request("POST", &publish_uri, owner, None)).await;
    assert_eq!(status, StatusCode::OK);
    let invites = ctx.email.sent.lock().unwrap().len();

    let nudge_uri = format!("/api/orgs/{}/campaigns/{}/nudges/send", org_id, campaign_id);

    let (status, first) = send(
        &ctx,
        request("POST", &nudge_uri, owner, Some(json!({"mode": "all_pending"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["sentCount"], 1);
    assert_eq!(first["deduplicatedCount"], 0);
    assert_eq!(first["mode"], "all_pending");
    assert_eq!(ctx.email.sent.lock().unwrap().len(), invites + 1);

    // Within the 24h window every eligible assignment is deduplicated
    let (status, second) = send(
        &ctx,
        request("POST", &nudge_uri, owner, Some(json!({"mode": "all_pending"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["sentCount"], 0);
    assert_eq!(second["deduplicatedCount"], 1);
    assert_eq!(ctx.email.sent.lock().unwrap().len(), invites + 1);
}

#[tokio::test]
async fn nudging_an_unpublished_campaign_sends_nothing() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let campaign = create_campaign(&ctx, owner, org_id, json!(["general"])).await;
    let campaign_id = campaign["id"].as_str().unwrap().to_string();

    // No assignments exist before publish, so there is nothing to remind
    let nudge_uri = format!("/api/orgs/{}/campaigns/{}/nudges/send", org_id, campaign_id);
    let (status, body) = send(&ctx, request("POST", &nudge_uri, owner, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentCount"], 0);
    assert_eq!(body["deduplicatedCount"], 0);
    assert!(ctx.email.sent.lock().unwrap().is_empty());
}

// =============================================================================
// Learner views
// =============================================================================

#[tokio::test]
async fn learner_assignment_detail_transitions_and_hides_answers() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let campaign = create_campaign(&ctx, owner, org_id, json!(["general"])).await;
    let campaign_id = campaign["id"].as_str().unwrap().to_string();
    let publish_uri = format!("/api/orgs/{}/campaigns/{}/publish", org_id, campaign_id);
    let (status, _body) = send(&ctx, request("POST", &publish_uri, owner, None)).await;
    assert_eq!(status, StatusCode::OK);

    // The owner is also the sole learner
    let (status, list) = send(&ctx, request("GET", "/api/me/assignments", owner, None)).await;
    assert_eq!(status, StatusCode::OK);
    let assignments = list["assignments"].as_array().unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0]["state"], "assigned");

    let assignment_id = assignments[0]["id"].as_str().unwrap().to_string();
    let detail_uri = format!("/api/me/assignments/{}", assignment_id);

    let (status, detail) = send(&ctx, request("GET", &detail_uri, owner, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["state"], "in_progress");
    assert_eq!(detail["module"]["roleTrack"], "general");
    assert!(detail["module"]["contentMarkdown"].as_str().unwrap().len() > 80);

    let questions = detail["quizQuestions"].as_array().unwrap();
    assert!(questions.len() >= 3);
    for question in questions {
        assert_eq!(question["choices"].as_array().unwrap().len(), 4);
        assert!(question.get("correctChoiceIndex").is_none());
        assert!(question.get("explanation").is_none());
    }

    // Revisiting does not regress the state
    let (status, revisit) = send(&ctx, request("GET", &detail_uri, owner, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revisit["state"], "in_progress");

    // Another user cannot see it
    let (status, body) = send(&ctx, request("GET", &detail_uri, Uuid::new_v4(), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Uploads
// =============================================================================

fn multipart_request(
    uri: &str,
    user_id: Uuid,
    boundary: &str,
    body: Vec<u8>,
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-user-id", user_id.to_string())
        .header("x-user-email", format!("user-{}@test.example", user_id))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

fn policy_upload_body(boundary: &str, file_name: &str, mime: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\ncontent-disposition: form-data; name=\"title\"\r\n\r\nAI Policy\r\n--{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"{f}\"\r\ncontent-type: {m}\r\n\r\n",
            b = boundary,
            f = file_name,
            m = mime
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test]
async fn policy_upload_normalizes_name_and_rejects_mismatch() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let uri = format!("/api/orgs/{}/policies", org_id);
    let boundary = "test-boundary-7a3f";

    let (status, body) = send(
        &ctx,
        multipart_request(
            &uri,
            owner,
            boundary,
            policy_upload_body(boundary, "AI Policy Final 2026!.pdf", "application/pdf", b"%PDF-1.4 test"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
    assert_eq!(body["fileName"], "AI-Policy-Final-2026.pdf");
    assert_eq!(body["parseStatus"], "pending");

    // Listing shows it
    let (status, list) = send(&ctx, request("GET", &uri, owner, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["policies"].as_array().unwrap().len(), 1);

    // Extension/MIME mismatch is rejected before any side effect
    let (status, body) = send(
        &ctx,
        multipart_request(
            &uri,
            owner,
            boundary,
            policy_upload_body(boundary, "policy.pdf", "text/plain", b"not a pdf"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

fn media_upload_body(boundary: &str, file_name: &str, mime: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"{f}\"\r\ncontent-type: {m}\r\n\r\n",
            b = boundary,
            f = file_name,
            m = mime
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test]
async fn media_attaches_to_matching_embed_slot_in_draft_only() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let campaign = create_campaign(&ctx, owner, org_id, json!(["general"])).await;
    let campaign_id = campaign["id"].as_str().unwrap().to_string();
    let module = &campaign["modules"][0];
    let module_id = module["id"].as_str().unwrap().to_string();

    let embeds = module["mediaEmbeds"].as_array().unwrap();
    let image_embed = embeds.iter().find(|e| e["kind"] == "image").unwrap();
    let embed_id = image_embed["id"].as_str().unwrap().to_string();

    let uri = format!(
        "/api/orgs/{}/campaigns/{}/modules/{}/media/{}",
        org_id, campaign_id, module_id, embed_id
    );
    let boundary = "test-boundary-2c9d";

    // Kind mismatch: video file into an image slot
    let (status, body) = send(
        &ctx,
        multipart_request(
            &uri,
            owner,
            boundary,
            media_upload_body(boundary, "walkthrough.mp4", "video/mp4", b"fake-video"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    // Matching upload attaches
    let (status, body) = send(
        &ctx,
        multipart_request(
            &uri,
            owner,
            boundary,
            media_upload_body(boundary, "Decision Map.png", "image/png", b"\x89PNG fake"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["embed"]["status"], "attached");
    assert!(body["embed"]["assetPath"]
        .as_str()
        .unwrap()
        .ends_with("Decision-Map.png"));

    // After publish the campaign no longer accepts media
    let publish_uri = format!("/api/orgs/{}/campaigns/{}/publish", org_id, campaign_id);
    let (status, _body) = send(&ctx, request("POST", &publish_uri, owner, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &ctx,
        multipart_request(
            &uri,
            owner,
            boundary,
            media_upload_body(boundary, "late.png", "image/png", b"\x89PNG late"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

// =============================================================================
// Quiz regeneration
// =============================================================================

#[tokio::test]
async fn quiz_regeneration_skips_in_sync_modules_unless_forced() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let org_id = bootstrap_org(&ctx, owner).await;

    let campaign = create_campaign(&ctx, owner, org_id, json!(["exec"])).await;
    let campaign_id = campaign["id"].as_str().unwrap().to_string();
    let module_id = campaign["modules"][0]["id"].as_str().unwrap().to_string();
    let original_hash = campaign["modules"][0]["quizSyncHash"].clone();

    let uri = format!(
        "/api/orgs/{}/campaigns/{}/modules/{}/quiz/regenerate",
        org_id, campaign_id, module_id
    );

    // Content unchanged since generation: nothing to do
    let (status, body) = send(&ctx, request("POST", &uri, owner, Some(json!({})))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["regenerated"], false);
    assert_eq!(body["quizSyncHash"], original_hash);

    // Forced regeneration rebuilds the quiz and keeps the hash in sync
    let (status, body) = send(
        &ctx,
        request("POST", &uri, owner, Some(json!({"force": true}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["regenerated"], true);
    assert_eq!(body["quizSyncHash"], original_hash);
    assert!(body["questionCount"].as_u64().unwrap() >= 3);
}
