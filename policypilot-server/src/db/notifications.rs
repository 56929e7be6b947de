//! Reminder send ledger
//!
//! One row per reminder actually sent. Nudge deduplication reads this
//! table: an assignment reminded within the window is skipped.

use policypilot_common::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;
use uuid::Uuid;

pub const REMINDER_KIND: &str = "reminder";

/// Assignments in this campaign that already received a reminder at or
/// after `since` (RFC 3339; string comparison is chronological)
pub async fn recently_notified(
    pool: &SqlitePool,
    campaign_id: Uuid,
    since: &str,
) -> Result<HashSet<Uuid>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT assignment_id
        FROM notification_jobs
        WHERE campaign_id = ? AND kind = ? AND sent_at >= ?
        "#,
    )
    .bind(campaign_id.to_string())
    .bind(REMINDER_KIND)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(id,)| Uuid::parse_str(&id).ok())
        .collect())
}

/// Record one reminder row per assignment just sent
pub async fn record_reminders(
    pool: &SqlitePool,
    campaign_id: Uuid,
    assignment_ids: &[Uuid],
) -> Result<()> {
    let now = super::now_rfc3339();
    for assignment_id in assignment_ids {
        sqlx::query(
            r#"
            INSERT INTO notification_jobs (id, campaign_id, assignment_id, kind, sent_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(campaign_id.to_string())
        .bind(assignment_id.to_string())
        .bind(REMINDER_KIND)
        .bind(&now)
        .execute(pool)
        .await?;
    }
    Ok(())
}
