//! Assignments: the fan-out of published modules to org members

use policypilot_common::types::AssignmentState;
use policypilot_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::now_rfc3339;

/// A learner-facing assignment summary joined to its module and campaign
#[derive(Debug, Clone)]
pub struct AssignmentListItem {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub module_id: Uuid,
    pub module_title: String,
    pub role_track: String,
    pub state: AssignmentState,
    pub due_at: Option<String>,
    pub assigned_at: String,
    pub estimated_minutes: i64,
}

/// One pending assignment eligible for a reminder, joined to the member
/// email and campaign name
#[derive(Debug, Clone)]
pub struct PendingAssignment {
    pub assignment_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub campaign_name: String,
    pub state: AssignmentState,
}

/// One assignment row scoped to its owning user
#[derive(Debug, Clone)]
pub struct AssignmentRecord {
    pub id: Uuid,
    pub org_id: Uuid,
    pub campaign_id: Uuid,
    pub module_id: Uuid,
    pub user_id: Uuid,
    pub state: AssignmentState,
    pub due_at: Option<String>,
    pub assigned_at: String,
}

/// Insert one assignment per (module, member) pair, skipping pairs that
/// already exist. Each row inherits the campaign due date. Returns how
/// many rows were actually created, so a replayed fan-out reports zero.
pub async fn upsert_assignments(
    pool: &SqlitePool,
    org_id: Uuid,
    campaign_id: Uuid,
    module_ids: &[Uuid],
    user_ids: &[Uuid],
    due_at: Option<&str>,
) -> Result<u64> {
    let now = now_rfc3339();
    let mut created = 0u64;

    for module_id in module_ids {
        for user_id in user_ids {
            let result = sqlx::query(
                r#"
                INSERT INTO assignments
                    (id, org_id, campaign_id, module_id, user_id, state, due_at, assigned_at)
                VALUES (?, ?, ?, ?, ?, 'assigned', ?, ?)
                ON CONFLICT (campaign_id, module_id, user_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(org_id.to_string())
            .bind(campaign_id.to_string())
            .bind(module_id.to_string())
            .bind(user_id.to_string())
            .bind(due_at)
            .bind(&now)
            .execute(pool)
            .await?;

            created += result.rows_affected();
        }
    }

    Ok(created)
}

pub async fn count_for_campaign(pool: &SqlitePool, campaign_id: Uuid) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM assignments WHERE campaign_id = ?")
            .bind(campaign_id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Each member's first assignment in a campaign, used as the invite deep
/// link (one invite per member, not per module)
pub async fn first_assignment_per_user(
    pool: &SqlitePool,
    campaign_id: Uuid,
) -> Result<Vec<PendingAssignment>> {
    let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
        r#"
        SELECT a.id, a.user_id, m.email, c.name, a.state
        FROM assignments a
        JOIN organization_members m ON m.org_id = a.org_id AND m.user_id = a.user_id
        JOIN learning_campaigns c ON c.id = a.campaign_id
        WHERE a.campaign_id = ?
        ORDER BY a.rowid ASC
        "#,
    )
    .bind(campaign_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut seen: Vec<Uuid> = Vec::new();
    let mut out = Vec::new();
    for (assignment_id, user_id, email, campaign_name, state) in rows {
        let Ok(user_id) = Uuid::parse_str(&user_id) else {
            continue;
        };
        if seen.contains(&user_id) {
            continue;
        }
        seen.push(user_id);

        let (Ok(assignment_id), Some(state)) =
            (Uuid::parse_str(&assignment_id), AssignmentState::parse(&state))
        else {
            continue;
        };

        out.push(PendingAssignment {
            assignment_id,
            user_id,
            email,
            campaign_name,
            state,
        });
    }

    Ok(out)
}

/// Assignments in one campaign still in any of `states`, joined to the
/// member email for reminder delivery
pub async fn pending_for_campaign(
    pool: &SqlitePool,
    campaign_id: Uuid,
    states: &[AssignmentState],
) -> Result<Vec<PendingAssignment>> {
    if states.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; states.len()].join(", ");
    let sql = format!(
        r#"
        SELECT a.id, a.user_id, m.email, c.name, a.state
        FROM assignments a
        JOIN organization_members m ON m.org_id = a.org_id AND m.user_id = a.user_id
        JOIN learning_campaigns c ON c.id = a.campaign_id
        WHERE a.campaign_id = ? AND a.state IN ({})
        ORDER BY a.rowid ASC
        "#,
        placeholders
    );

    let mut query = sqlx::query_as(&sql).bind(campaign_id.to_string());
    for state in states {
        query = query.bind(state.as_str());
    }

    let rows: Vec<(String, String, String, String, String)> = query.fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .filter_map(|(assignment_id, user_id, email, campaign_name, state)| {
            Some(PendingAssignment {
                assignment_id: Uuid::parse_str(&assignment_id).ok()?,
                user_id: Uuid::parse_str(&user_id).ok()?,
                email,
                campaign_name,
                state: AssignmentState::parse(&state)?,
            })
        })
        .collect())
}

/// All of one learner's assignments, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<AssignmentListItem>> {
    type ListTuple = (
        String,
        String,
        String,
        String,
        String,
        String,
        String,
        Option<String>,
        String,
        i64,
    );
    let rows: Vec<ListTuple> = sqlx::query_as(
        r#"
        SELECT a.id, a.campaign_id, c.name, a.module_id, lm.title, lm.role_track,
               a.state, a.due_at, a.assigned_at, lm.estimated_minutes
        FROM assignments a
        JOIN learning_campaigns c ON c.id = a.campaign_id
        JOIN learning_modules lm ON lm.id = a.module_id
        WHERE a.user_id = ?
        ORDER BY a.assigned_at DESC, a.rowid DESC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(
            |(
                id,
                campaign_id,
                campaign_name,
                module_id,
                module_title,
                role_track,
                state,
                due_at,
                assigned_at,
                estimated_minutes,
            )| {
                Some(AssignmentListItem {
                    id: Uuid::parse_str(&id).ok()?,
                    campaign_id: Uuid::parse_str(&campaign_id).ok()?,
                    campaign_name,
                    module_id: Uuid::parse_str(&module_id).ok()?,
                    module_title,
                    role_track,
                    state: AssignmentState::parse(&state)?,
                    due_at,
                    assigned_at,
                    estimated_minutes,
                })
            },
        )
        .collect())
}

/// Load one assignment if it belongs to this user
pub async fn load_for_user(
    pool: &SqlitePool,
    assignment_id: Uuid,
    user_id: Uuid,
) -> Result<Option<AssignmentRecord>> {
    type RecordTuple = (String, String, String, String, String, String, Option<String>, String);
    let row: Option<RecordTuple> = sqlx::query_as(
        r#"
        SELECT id, org_id, campaign_id, module_id, user_id, state, due_at, assigned_at
        FROM assignments
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(assignment_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(
        |(id, org_id, campaign_id, module_id, user_id, state, due_at, assigned_at)| {
            Some(AssignmentRecord {
                id: Uuid::parse_str(&id).ok()?,
                org_id: Uuid::parse_str(&org_id).ok()?,
                campaign_id: Uuid::parse_str(&campaign_id).ok()?,
                module_id: Uuid::parse_str(&module_id).ok()?,
                user_id: Uuid::parse_str(&user_id).ok()?,
                state: AssignmentState::parse(&state)?,
                due_at,
                assigned_at,
            })
        },
    ))
}

/// First-view transition: assigned → in_progress. A no-op in any other
/// state, so a revisit never regresses progress.
pub async fn mark_in_progress(pool: &SqlitePool, assignment_id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE assignments
        SET state = 'in_progress', started_at = ?
        WHERE id = ? AND state = 'assigned'
        "#,
    )
    .bind(now_rfc3339())
    .bind(assignment_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
