//! Learning campaigns, modules, and quiz questions

use policypilot_common::types::{CampaignStatus, RoleTrack};
use policypilot_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{MediaEmbed, QuizQuestion};

use super::now_rfc3339;

/// A campaign row
#[derive(Debug, Clone)]
pub struct CampaignRow {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub status: CampaignStatus,
    pub flow_version: i64,
    pub source_policy_id: Option<Uuid>,
    pub due_at: Option<String>,
    pub created_at: String,
    pub published_at: Option<String>,
}

/// A learning module row with parsed media embeds
#[derive(Debug, Clone)]
pub struct ModuleRow {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub role_track: RoleTrack,
    pub title: String,
    pub summary: String,
    pub content_markdown: String,
    pub pass_score: i64,
    pub estimated_minutes: i64,
    pub media_embeds: Vec<MediaEmbed>,
    pub quiz_sync_hash: Option<String>,
}

pub struct NewCampaign<'a> {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: &'a str,
    pub flow_version: i64,
    pub source_policy_id: Option<Uuid>,
    pub created_by: Uuid,
    pub due_at: Option<&'a str>,
}

pub struct NewModule<'a> {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub role_track: RoleTrack,
    pub title: &'a str,
    pub summary: &'a str,
    pub content_markdown: &'a str,
    pub pass_score: i64,
    pub estimated_minutes: i64,
    pub media_embeds: &'a [MediaEmbed],
    pub quiz_sync_hash: &'a str,
}

pub async fn insert_campaign(pool: &SqlitePool, campaign: &NewCampaign<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO learning_campaigns
            (id, org_id, name, status, flow_version, source_policy_id, created_by, due_at, created_at)
        VALUES (?, ?, ?, 'draft', ?, ?, ?, ?, ?)
        "#,
    )
    .bind(campaign.id.to_string())
    .bind(campaign.org_id.to_string())
    .bind(campaign.name)
    .bind(campaign.flow_version)
    .bind(campaign.source_policy_id.map(|id| id.to_string()))
    .bind(campaign.created_by.to_string())
    .bind(campaign.due_at)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_campaign(
    pool: &SqlitePool,
    org_id: Uuid,
    campaign_id: Uuid,
) -> Result<Option<CampaignRow>> {
    let row: Option<CampaignTuple> = sqlx::query_as(
        r#"
        SELECT id, org_id, name, status, flow_version, source_policy_id,
               due_at, created_at, published_at
        FROM learning_campaigns
        WHERE org_id = ? AND id = ?
        "#,
    )
    .bind(org_id.to_string())
    .bind(campaign_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(campaign_from_tuple))
}

type CampaignTuple = (
    String,
    String,
    String,
    String,
    i64,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
);

fn campaign_from_tuple(tuple: CampaignTuple) -> Option<CampaignRow> {
    let (id, org, name, status, flow_version, source_policy_id, due_at, created_at, published_at) =
        tuple;

    Some(CampaignRow {
        id: Uuid::parse_str(&id).ok()?,
        org_id: Uuid::parse_str(&org).ok()?,
        name,
        status: CampaignStatus::parse(&status)?,
        flow_version,
        source_policy_id: source_policy_id.and_then(|id| Uuid::parse_str(&id).ok()),
        due_at,
        created_at,
        published_at,
    })
}

/// All campaigns in one org, newest first
pub async fn list_campaigns(pool: &SqlitePool, org_id: Uuid) -> Result<Vec<CampaignRow>> {
    let rows: Vec<CampaignTuple> = sqlx::query_as(
        r#"
        SELECT id, org_id, name, status, flow_version, source_policy_id,
               due_at, created_at, published_at
        FROM learning_campaigns
        WHERE org_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(org_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(campaign_from_tuple).collect())
}

/// Compare-and-set publish: flips draft → published and stamps the time.
/// Returns false when the campaign was not in draft (a concurrent publish
/// won, or the campaign is archived).
pub async fn mark_published_if_draft(
    pool: &SqlitePool,
    org_id: Uuid,
    campaign_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE learning_campaigns
        SET status = 'published', published_at = ?
        WHERE org_id = ? AND id = ? AND status = 'draft'
        "#,
    )
    .bind(now_rfc3339())
    .bind(org_id.to_string())
    .bind(campaign_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn insert_module(pool: &SqlitePool, module: &NewModule<'_>) -> Result<()> {
    let embeds_json = serde_json::to_string(module.media_embeds)
        .map_err(|e| Error::Internal(format!("Failed to serialize media embeds: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO learning_modules
            (id, campaign_id, role_track, title, summary, content_markdown,
             pass_score, estimated_minutes, media_embeds_json, quiz_sync_hash, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(module.id.to_string())
    .bind(module.campaign_id.to_string())
    .bind(module.role_track.as_str())
    .bind(module.title)
    .bind(module.summary)
    .bind(module.content_markdown)
    .bind(module.pass_score)
    .bind(module.estimated_minutes)
    .bind(embeds_json)
    .bind(module.quiz_sync_hash)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

type ModuleTuple = (
    String,
    String,
    String,
    String,
    String,
    String,
    i64,
    i64,
    String,
    Option<String>,
);

fn module_from_tuple(tuple: ModuleTuple) -> Option<ModuleRow> {
    let (
        id,
        campaign_id,
        role_track,
        title,
        summary,
        content_markdown,
        pass_score,
        estimated_minutes,
        media_embeds_json,
        quiz_sync_hash,
    ) = tuple;

    Some(ModuleRow {
        id: Uuid::parse_str(&id).ok()?,
        campaign_id: Uuid::parse_str(&campaign_id).ok()?,
        role_track: RoleTrack::parse(&role_track)?,
        title,
        summary,
        content_markdown,
        pass_score,
        estimated_minutes,
        media_embeds: serde_json::from_str(&media_embeds_json).unwrap_or_default(),
        quiz_sync_hash,
    })
}

const MODULE_COLUMNS: &str = "id, campaign_id, role_track, title, summary, content_markdown, \
     pass_score, estimated_minutes, media_embeds_json, quiz_sync_hash";

/// Modules in canonical track order (exec, builder, general)
pub async fn modules_for_campaign(pool: &SqlitePool, campaign_id: Uuid) -> Result<Vec<ModuleRow>> {
    let rows: Vec<ModuleTuple> = sqlx::query_as(&format!(
        r#"
        SELECT {}
        FROM learning_modules
        WHERE campaign_id = ?
        ORDER BY CASE role_track WHEN 'exec' THEN 0 WHEN 'builder' THEN 1 ELSE 2 END
        "#,
        MODULE_COLUMNS
    ))
    .bind(campaign_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(module_from_tuple).collect())
}

pub async fn load_module(
    pool: &SqlitePool,
    campaign_id: Uuid,
    module_id: Uuid,
) -> Result<Option<ModuleRow>> {
    let row: Option<ModuleTuple> = sqlx::query_as(&format!(
        "SELECT {} FROM learning_modules WHERE campaign_id = ? AND id = ?",
        MODULE_COLUMNS
    ))
    .bind(campaign_id.to_string())
    .bind(module_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(module_from_tuple))
}

/// Persist an updated embed list for one module
pub async fn update_module_media_embeds(
    pool: &SqlitePool,
    module_id: Uuid,
    media_embeds: &[MediaEmbed],
) -> Result<()> {
    let embeds_json = serde_json::to_string(media_embeds)
        .map_err(|e| Error::Internal(format!("Failed to serialize media embeds: {}", e)))?;

    sqlx::query("UPDATE learning_modules SET media_embeds_json = ? WHERE id = ?")
        .bind(embeds_json)
        .bind(module_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn insert_quiz_questions(
    pool: &SqlitePool,
    module_id: Uuid,
    questions: &[QuizQuestion],
) -> Result<()> {
    for (index, question) in questions.iter().enumerate() {
        let choices_json = serde_json::to_string(&question.choices)
            .map_err(|e| Error::Internal(format!("Failed to serialize choices: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO quiz_questions
                (id, module_id, prompt, choices_json, correct_choice_index, explanation, question_order)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(module_id.to_string())
        .bind(&question.prompt)
        .bind(choices_json)
        .bind(question.correct_choice_index as i64)
        .bind(&question.explanation)
        .bind(index as i64)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Replace a module's quiz and stamp the new sync hash atomically
pub async fn replace_module_quiz(
    pool: &SqlitePool,
    module_id: Uuid,
    questions: &[QuizQuestion],
    quiz_sync_hash: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM quiz_questions WHERE module_id = ?")
        .bind(module_id.to_string())
        .execute(&mut *tx)
        .await?;

    for (index, question) in questions.iter().enumerate() {
        let choices_json = serde_json::to_string(&question.choices)
            .map_err(|e| Error::Internal(format!("Failed to serialize choices: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO quiz_questions
                (id, module_id, prompt, choices_json, correct_choice_index, explanation, question_order)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(module_id.to_string())
        .bind(&question.prompt)
        .bind(choices_json)
        .bind(question.correct_choice_index as i64)
        .bind(&question.explanation)
        .bind(index as i64)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE learning_modules SET quiz_sync_hash = ? WHERE id = ?")
        .bind(quiz_sync_hash)
        .bind(module_id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Quiz questions for one module in display order
pub async fn quiz_questions_for_module(
    pool: &SqlitePool,
    module_id: Uuid,
) -> Result<Vec<QuizQuestion>> {
    let rows: Vec<(String, String, i64, String)> = sqlx::query_as(
        r#"
        SELECT prompt, choices_json, correct_choice_index, explanation
        FROM quiz_questions
        WHERE module_id = ?
        ORDER BY question_order ASC
        "#,
    )
    .bind(module_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(prompt, choices_json, correct_choice_index, explanation)| {
            Some(QuizQuestion {
                prompt,
                choices: serde_json::from_str(&choices_json).ok()?,
                correct_choice_index: u8::try_from(correct_choice_index).ok()?,
                explanation,
            })
        })
        .collect())
}
