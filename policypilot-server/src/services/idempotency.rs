//! Idempotency key handling and replay lookup
//!
//! Keyed deduplication for side-effectful admin actions. The audit log
//! doubles as the idempotency ledger: a successful mutation records its
//! response under `metadata.response` together with a one-way hash of the
//! caller's key, and a retry with the same key is served that stored
//! response instead of re-executing.
//!
//! This is a cooperative guard against client retries, not a strict
//! exactly-once mechanism: two requests racing before either has written
//! its success row can both execute. The scan is bounded to the newest 50
//! successful entries per (org, user, action).

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

const IDEMPOTENCY_HEADER: &str = "idempotency-key";
const MAX_KEY_LENGTH: usize = 128;
const SCAN_LIMIT: i64 = 50;

/// Read and validate the `Idempotency-Key` header. A missing or
/// whitespace-only header means the request is not idempotent; an
/// over-long key is rejected before any side effect.
pub fn idempotency_key_from_headers(headers: &HeaderMap) -> ApiResult<Option<String>> {
    let raw = match headers.get(IDEMPOTENCY_HEADER) {
        Some(value) => value,
        None => return Ok(None),
    };

    let key = raw
        .to_str()
        .map_err(|_| ApiError::Validation("Idempotency-Key must be valid ASCII.".to_string()))?
        .trim();

    if key.is_empty() {
        return Ok(None);
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(ApiError::Validation(
            "Idempotency-Key must be 128 characters or fewer.".to_string(),
        ));
    }

    Ok(Some(key.to_string()))
}

/// One-way hash applied before storage or comparison; raw keys are never
/// persisted
pub fn hash_idempotency_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Attach the key hash to an audit-log metadata object, when present
pub fn with_idempotency_metadata(mut metadata: Value, key_hash: Option<&str>) -> Value {
    if let (Some(hash), Some(object)) = (key_hash, metadata.as_object_mut()) {
        object.insert("idempotencyKeyHash".to_string(), Value::String(hash.to_string()));
    }
    metadata
}

/// Look for a prior successful request with the same key and return its
/// recorded response.
///
/// The optional `resource` pair guards against a reused key replaying
/// against a different resource. Lookup failures are swallowed: a broken
/// ledger read means "no replay", never a failed request.
pub async fn find_idempotent_success<T: DeserializeOwned>(
    db: &SqlitePool,
    org_id: Uuid,
    user_id: Uuid,
    action: &str,
    idempotency_key_hash: Option<&str>,
    resource: Option<(&str, &str)>,
) -> Option<T> {
    let key_hash = idempotency_key_hash?;

    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT metadata_json
        FROM request_audit_logs
        WHERE org_id = ? AND user_id = ? AND action = ? AND status_code = 200
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(org_id.to_string())
    .bind(user_id.to_string())
    .bind(action)
    .bind(SCAN_LIMIT)
    .fetch_all(db)
    .await
    .ok()?;

    for (metadata_json,) in rows {
        let metadata: Value = match serde_json::from_str(&metadata_json) {
            Ok(value) => value,
            Err(_) => continue,
        };

        if metadata.get("idempotencyKeyHash").and_then(Value::as_str) != Some(key_hash) {
            continue;
        }

        if let Some((field, expected)) = resource {
            if metadata.get(field).and_then(Value::as_str) != Some(expected) {
                continue;
            }
        }

        if let Some(response) = metadata.get("response") {
            if response.is_object() {
                if let Ok(parsed) = serde_json::from_value(response.clone()) {
                    tracing::info!(
                        org_id = %org_id,
                        user_id = %user_id,
                        action = action,
                        "Idempotent replay detected; returning stored response"
                    );
                    return Some(parsed);
                }
            }
        }
    }

    None
}
