//! Request identity and org access checks
//!
//! Identity arrives from the fronting auth proxy as trusted headers
//! (`X-User-Id`, `X-User-Email`); the server never sees credentials.
//! Authorization is a per-org role check against the membership table.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::SqlitePool;
use uuid::Uuid;

use policypilot_common::types::{has_minimum_role, OrgRole};

use crate::db;
use crate::error::{ApiError, ApiResult};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller of one request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| ApiError::Auth("Missing or invalid user identity.".to_string()))?;

        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        Ok(AuthContext { user_id, email })
    }
}

/// Require at least `minimum` role in the org. A non-member gets 404
/// rather than 403, so org existence is not leaked across tenants.
pub async fn require_org_role(
    db: &SqlitePool,
    org_id: Uuid,
    user_id: Uuid,
    minimum: OrgRole,
) -> ApiResult<OrgRole> {
    let role = db::orgs::member_role(db, org_id, user_id).await?;

    match role {
        None => Err(ApiError::NotFound("Organization not found.".to_string())),
        Some(role) if has_minimum_role(Some(role), minimum) => Ok(role),
        Some(_) => Err(ApiError::Auth(
            "You do not have permission to perform this action.".to_string(),
        )),
    }
}
