//! Policy documents and extracted obligations

use policypilot_common::types::{ParseStatus, RoleTrack};
use policypilot_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::now_rfc3339;

/// A stored policy document record
#[derive(Debug, Clone)]
pub struct PolicyDocument {
    pub id: Uuid,
    pub org_id: Uuid,
    pub title: String,
    pub file_path: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub parse_status: ParseStatus,
    pub created_at: String,
}

/// One extracted obligation row
#[derive(Debug, Clone)]
pub struct ObligationRecord {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub detail: String,
    pub role_track: RoleTrack,
}

/// Fields for inserting a freshly uploaded policy document
pub struct NewPolicyDocument<'a> {
    pub id: Uuid,
    pub org_id: Uuid,
    pub title: &'a str,
    pub file_path: &'a str,
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub size_bytes: i64,
    pub uploaded_by: Uuid,
}

pub async fn insert_policy_document(pool: &SqlitePool, doc: &NewPolicyDocument<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO policy_documents
            (id, org_id, title, file_path, file_name, mime_type, size_bytes,
             parse_status, uploaded_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)
        "#,
    )
    .bind(doc.id.to_string())
    .bind(doc.org_id.to_string())
    .bind(doc.title)
    .bind(doc.file_path)
    .bind(doc.file_name)
    .bind(doc.mime_type)
    .bind(doc.size_bytes)
    .bind(doc.uploaded_by.to_string())
    .bind(now_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_policy_document(
    pool: &SqlitePool,
    org_id: Uuid,
    policy_id: Uuid,
) -> Result<Option<PolicyDocument>> {
    let row: Option<(String, String, String, String, String, String, i64, String, String)> =
        sqlx::query_as(
            r#"
            SELECT id, org_id, title, file_path, file_name, mime_type, size_bytes,
                   parse_status, created_at
            FROM policy_documents
            WHERE org_id = ? AND id = ?
            "#,
        )
        .bind(org_id.to_string())
        .bind(policy_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(
        |(id, org, title, file_path, file_name, mime_type, size_bytes, parse_status, created_at)| {
            Some(PolicyDocument {
                id: Uuid::parse_str(&id).ok()?,
                org_id: Uuid::parse_str(&org).ok()?,
                title,
                file_path,
                file_name,
                mime_type,
                size_bytes,
                parse_status: match parse_status.as_str() {
                    "ready" => ParseStatus::Ready,
                    "failed" => ParseStatus::Failed,
                    _ => ParseStatus::Pending,
                },
                created_at,
            })
        },
    ))
}

/// All policy documents in one org, newest first
pub async fn list_policy_documents(pool: &SqlitePool, org_id: Uuid) -> Result<Vec<PolicyDocument>> {
    let rows: Vec<(String, String, String, String, String, String, i64, String, String)> =
        sqlx::query_as(
            r#"
            SELECT id, org_id, title, file_path, file_name, mime_type, size_bytes,
                   parse_status, created_at
            FROM policy_documents
            WHERE org_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id.to_string())
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(
            |(id, org, title, file_path, file_name, mime_type, size_bytes, parse_status, created_at)| {
                Some(PolicyDocument {
                    id: Uuid::parse_str(&id).ok()?,
                    org_id: Uuid::parse_str(&org).ok()?,
                    title,
                    file_path,
                    file_name,
                    mime_type,
                    size_bytes,
                    parse_status: match parse_status.as_str() {
                        "ready" => ParseStatus::Ready,
                        "failed" => ParseStatus::Failed,
                        _ => ParseStatus::Pending,
                    },
                    created_at,
                })
            },
        )
        .collect())
}

pub async fn insert_obligation(
    pool: &SqlitePool,
    org_id: Uuid,
    policy_id: Uuid,
    detail: &str,
    role_track: RoleTrack,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO obligations (id, policy_id, org_id, detail, role_track, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(policy_id.to_string())
    .bind(org_id.to_string())
    .bind(detail)
    .bind(role_track.as_str())
    .bind(now_rfc3339())
    .execute(pool)
    .await?;
    Ok(id)
}

/// All obligations for one org, optionally scoped to one policy
pub async fn obligations_for_org(
    pool: &SqlitePool,
    org_id: Uuid,
    policy_id: Option<Uuid>,
) -> Result<Vec<ObligationRecord>> {
    let rows: Vec<(String, String, String, String)> = match policy_id {
        Some(policy_id) => {
            sqlx::query_as(
                r#"
                SELECT id, policy_id, detail, role_track
                FROM obligations
                WHERE org_id = ? AND policy_id = ?
                ORDER BY created_at ASC
                "#,
            )
            .bind(org_id.to_string())
            .bind(policy_id.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                r#"
                SELECT id, policy_id, detail, role_track
                FROM obligations
                WHERE org_id = ?
                ORDER BY created_at ASC
                "#,
            )
            .bind(org_id.to_string())
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .filter_map(|(id, policy_id, detail, role_track)| {
            Some(ObligationRecord {
                id: Uuid::parse_str(&id).ok()?,
                policy_id: Uuid::parse_str(&policy_id).ok()?,
                detail,
                role_track: RoleTrack::parse(&role_track)?,
            })
        })
        .collect())
}
