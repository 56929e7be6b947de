//! Organizations and memberships

use policypilot_common::types::{OrgMembership, OrgRole};
use policypilot_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::now_rfc3339;

/// One member row as returned to admins
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub user_id: Uuid,
    pub email: String,
    pub role: OrgRole,
}

pub async fn create_organization(pool: &SqlitePool, name: &str) -> Result<Uuid> {
    let org_id = Uuid::new_v4();
    sqlx::query("INSERT INTO organizations (id, name, created_at) VALUES (?, ?, ?)")
        .bind(org_id.to_string())
        .bind(name)
        .bind(now_rfc3339())
        .execute(pool)
        .await?;
    Ok(org_id)
}

/// Insert or update a membership (upsert keeps role and email current)
pub async fn upsert_member(
    pool: &SqlitePool,
    org_id: Uuid,
    user_id: Uuid,
    email: &str,
    role: OrgRole,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO organization_members (org_id, user_id, email, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (org_id, user_id) DO UPDATE SET email = excluded.email, role = excluded.role
        "#,
    )
    .bind(org_id.to_string())
    .bind(user_id.to_string())
    .bind(email)
    .bind(role.as_str())
    .bind(now_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// The earliest-created organization, if any exist
pub async fn oldest_organization(pool: &SqlitePool) -> Result<Option<(Uuid, String)>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT id, name FROM organizations ORDER BY created_at ASC, rowid ASC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(row.and_then(|(id, name)| Some((Uuid::parse_str(&id).ok()?, name))))
}

/// The caller's role in one org, if they are a member
pub async fn member_role(pool: &SqlitePool, org_id: Uuid, user_id: Uuid) -> Result<Option<OrgRole>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT role FROM organization_members WHERE org_id = ? AND user_id = ?")
            .bind(org_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(row.and_then(|(role,)| OrgRole::parse(&role)))
}

/// Every org the user belongs to, joined to the org name
pub async fn memberships_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<OrgMembership>> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT m.org_id, o.name, m.role
        FROM organization_members m
        JOIN organizations o ON o.id = m.org_id
        WHERE m.user_id = ?
        ORDER BY m.created_at ASC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(org_id, org_name, role)| {
            Some(OrgMembership {
                org_id: Uuid::parse_str(&org_id).ok()?,
                org_name,
                role: OrgRole::parse(&role)?,
            })
        })
        .collect())
}

/// All members of one org, owners first
pub async fn members_of_org(pool: &SqlitePool, org_id: Uuid) -> Result<Vec<MemberRecord>> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT user_id, email, role
        FROM organization_members
        WHERE org_id = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(org_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(user_id, email, role)| {
            Some(MemberRecord {
                user_id: Uuid::parse_str(&user_id).ok()?,
                email,
                role: OrgRole::parse(&role)?,
            })
        })
        .collect())
}
