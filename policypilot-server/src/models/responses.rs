//! Workflow response shapes
//!
//! These are both the HTTP response bodies and the payloads stored under
//! `metadata.response` in the audit log for idempotent replay, so their
//! serde representation must stay stable.

use policypilot_common::types::NudgeMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of a campaign publish attempt.
///
/// Counts report against the actual draft→published transition, not this
/// caller's local effort: a racing caller that inserted rows but lost the
/// compare-and-swap reports `already_published` with zero counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub ok: bool,
    pub campaign_id: Uuid,
    pub already_published: bool,
    pub assignments_created: u64,
    pub assignments_total: u64,
    pub emailed_count: u64,
}

/// Result of a reminder send
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NudgeResponse {
    pub ok: bool,
    pub sent_count: u64,
    pub mode: NudgeMode,
    pub deduplicated_count: u64,
}
