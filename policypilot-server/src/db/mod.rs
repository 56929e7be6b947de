//! Database access for policypilot-server
//!
//! SQLite via sqlx. One pool per process; the schema is created on startup
//! with idempotent `CREATE TABLE IF NOT EXISTS` statements.
//!
//! Conventions: ids are UUIDs stored as TEXT, timestamps are RFC 3339 UTC
//! strings (which compare correctly as text), and enum-ish columns hold the
//! lowercase wire representation from `policypilot_common::types`.

pub mod assignments;
pub mod audit;
pub mod campaigns;
pub mod notifications;
pub mod orgs;
pub mod policies;

use policypilot_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;

/// Current UTC timestamp in the stored format
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Open (creating if needed) the database and ensure the schema exists
pub async fn init_database_pool(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    tracing::info!(path = %path.display(), "Database initialized");
    Ok(pool)
}

/// Create all tables if they do not exist. Also used directly by tests
/// against an in-memory pool.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS organization_members (
            org_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            email TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (org_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS policy_documents (
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            title TEXT NOT NULL,
            file_path TEXT NOT NULL,
            file_name TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            parse_status TEXT NOT NULL DEFAULT 'pending',
            uploaded_by TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS obligations (
            id TEXT PRIMARY KEY,
            policy_id TEXT NOT NULL,
            org_id TEXT NOT NULL,
            detail TEXT NOT NULL,
            role_track TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learning_campaigns (
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            flow_version INTEGER NOT NULL,
            source_policy_id TEXT,
            created_by TEXT NOT NULL,
            due_at TEXT,
            created_at TEXT NOT NULL,
            published_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learning_modules (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            role_track TEXT NOT NULL,
            title TEXT NOT NULL,
            summary TEXT NOT NULL,
            content_markdown TEXT NOT NULL,
            pass_score INTEGER NOT NULL,
            estimated_minutes INTEGER NOT NULL,
            media_embeds_json TEXT NOT NULL,
            quiz_sync_hash TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (campaign_id, role_track)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quiz_questions (
            id TEXT PRIMARY KEY,
            module_id TEXT NOT NULL,
            prompt TEXT NOT NULL,
            choices_json TEXT NOT NULL,
            correct_choice_index INTEGER NOT NULL,
            explanation TEXT NOT NULL,
            question_order INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assignments (
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL,
            campaign_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'assigned',
            due_at TEXT,
            assigned_at TEXT NOT NULL,
            started_at TEXT,
            completed_at TEXT,
            UNIQUE (campaign_id, module_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notification_jobs (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            assignment_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            sent_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS request_audit_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            request_id TEXT NOT NULL,
            route TEXT NOT NULL,
            action TEXT NOT NULL,
            status_code INTEGER NOT NULL,
            org_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            metadata_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        init_tables(&pool).await.unwrap();
        init_tables(&pool).await.unwrap();
    }
}
