//! Request audit log
//!
//! Every side-effectful admin action writes one row here. Besides the
//! audit trail itself, successful rows double as the idempotency ledger:
//! replay lookup scans them for a matching `metadata.idempotencyKeyHash`.

use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use policypilot_common::Result;

use super::now_rfc3339;

/// One audit-log row to be written
#[derive(Debug)]
pub struct AuditLogEntry<'a> {
    pub request_id: Uuid,
    pub route: &'a str,
    pub action: &'a str,
    pub status_code: i64,
    pub org_id: Uuid,
    pub user_id: Uuid,
    pub metadata: Value,
}

pub async fn write_request_audit_log(pool: &SqlitePool, entry: &AuditLogEntry<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO request_audit_logs
            (request_id, route, action, status_code, org_id, user_id, metadata_json, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.request_id.to_string())
    .bind(entry.route)
    .bind(entry.action)
    .bind(entry.status_code)
    .bind(entry.org_id.to_string())
    .bind(entry.user_id.to_string())
    .bind(entry.metadata.to_string())
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Audit writes must never fail the request they describe; a failed write
/// is logged and dropped
pub async fn write_request_audit_log_best_effort(pool: &SqlitePool, entry: &AuditLogEntry<'_>) {
    if let Err(e) = write_request_audit_log(pool, entry).await {
        tracing::warn!(
            action = entry.action,
            request_id = %entry.request_id,
            error = %e,
            "Failed to write audit log entry"
        );
    }
}
