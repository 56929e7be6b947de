//! Domain vocabulary shared across PolicyPilot crates
//!
//! Every enum here is persisted as lowercase text and serialized the same
//! way over the API, so `as_str`/`parse` and the serde representation must
//! stay in lockstep.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience segment a learning module targets.
///
/// Canonical ordering is exec, builder, general; generation and module
/// layout always follow that order regardless of request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleTrack {
    Exec,
    Builder,
    General,
}

/// Canonical track order: exec, builder, general
pub const TRACK_ORDER: [RoleTrack; 3] = [RoleTrack::Exec, RoleTrack::Builder, RoleTrack::General];

impl RoleTrack {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTrack::Exec => "exec",
            RoleTrack::Builder => "builder",
            RoleTrack::General => "general",
        }
    }

    /// Capitalized label used in generated titles ("Exec", "Builder", ...)
    pub fn label(&self) -> &'static str {
        match self {
            RoleTrack::Exec => "Exec",
            RoleTrack::Builder => "Builder",
            RoleTrack::General => "General",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "exec" => Some(RoleTrack::Exec),
            "builder" => Some(RoleTrack::Builder),
            "general" => Some(RoleTrack::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoleTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership role within an organization, totally ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Learner,
    Manager,
    Admin,
    Owner,
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Learner => "learner",
            OrgRole::Manager => "manager",
            OrgRole::Admin => "admin",
            OrgRole::Owner => "owner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "learner" => Some(OrgRole::Learner),
            "manager" => Some(OrgRole::Manager),
            "admin" => Some(OrgRole::Admin),
            "owner" => Some(OrgRole::Owner),
            _ => None,
        }
    }

    fn priority(&self) -> u8 {
        match self {
            OrgRole::Learner => 1,
            OrgRole::Manager => 2,
            OrgRole::Admin => 3,
            OrgRole::Owner => 4,
        }
    }
}

impl std::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `role` meets or exceeds `minimum`. An unknown role (None)
/// never satisfies any minimum.
pub fn has_minimum_role(role: Option<OrgRole>, minimum: OrgRole) -> bool {
    match role {
        Some(role) => role.priority() >= minimum.priority(),
        None => false,
    }
}

/// Learning campaign lifecycle state. draft → published is one-way;
/// archived is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Published,
    Archived,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Published => "published",
            CampaignStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(CampaignStatus::Draft),
            "published" => Some(CampaignStatus::Published),
            "archived" => Some(CampaignStatus::Archived),
            _ => None,
        }
    }
}

/// Assignment progression. assigned → in_progress happens on first view;
/// completed on quiz pass; overdue is derived externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    Assigned,
    InProgress,
    Overdue,
    Completed,
}

impl AssignmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentState::Assigned => "assigned",
            AssignmentState::InProgress => "in_progress",
            AssignmentState::Overdue => "overdue",
            AssignmentState::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "assigned" => Some(AssignmentState::Assigned),
            "in_progress" => Some(AssignmentState::InProgress),
            "overdue" => Some(AssignmentState::Overdue),
            "completed" => Some(AssignmentState::Completed),
            _ => None,
        }
    }
}

/// Media embed asset kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Media embed slot lifecycle: suggested until an admin attaches an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Suggested,
    Attached,
}

/// Reminder send selection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeMode {
    AllPending,
    OverdueOnly,
}

impl NudgeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NudgeMode::AllPending => "all_pending",
            NudgeMode::OverdueOnly => "overdue_only",
        }
    }
}

/// Policy document parse lifecycle, advanced by the external parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStatus {
    Pending,
    Ready,
    Failed,
}

impl ParseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStatus::Pending => "pending",
            ParseStatus::Ready => "ready",
            ParseStatus::Failed => "failed",
        }
    }
}

/// A user's membership in one organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgMembership {
    pub org_id: Uuid,
    pub org_name: String,
    pub role: OrgRole,
}

/// Resolve which org a request targets.
///
/// The first candidate matching an existing membership wins; with no
/// matching candidate, a sole membership is auto-selected; otherwise the
/// caller must choose explicitly (None).
pub fn pick_org_id(memberships: &[OrgMembership], candidates: &[Option<Uuid>]) -> Option<Uuid> {
    for candidate in candidates.iter().flatten() {
        if memberships.iter().any(|m| m.org_id == *candidate) {
            return Some(*candidate);
        }
    }

    if memberships.len() == 1 {
        return Some(memberships[0].org_id);
    }

    None
}
