//! policypilot-server library interface
//!
//! PolicyPilot compliance-training service: policy uploads, AI-assisted
//! campaign generation with a deterministic fallback, idempotent publish
//! fan-out, reminder nudges, and learner assignment delivery.
//!
//! Exposed as a library so workflow-level integration tests can drive the
//! services and router directly.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use policypilot_common::config::ServerConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::email::EmailDelivery;
use crate::services::generation::Generator;
use crate::services::rate_limit::ActionRateLimiter;
use crate::services::storage::ObjectStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Object storage for policy documents and module media
    pub storage: Arc<dyn ObjectStorage>,
    /// Outbound email delivery (invites, reminders)
    pub email: Arc<dyn EmailDelivery>,
    /// Campaign/quiz generator (AI-backed or deterministic)
    pub generator: Arc<Generator>,
    /// Per-(org, user, action) throttle for side-effectful admin actions
    pub rate_limiter: Arc<ActionRateLimiter>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        storage: Arc<dyn ObjectStorage>,
        email: Arc<dyn EmailDelivery>,
        generator: Generator,
        config: ServerConfig,
    ) -> Self {
        Self {
            db,
            storage,
            email,
            generator: Arc::new(generator),
            rate_limiter: Arc::new(ActionRateLimiter::default()),
            config: Arc::new(config),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes() as usize + 64 * 1024;

    Router::new()
        .merge(api::health::routes())
        .merge(api::me::routes())
        .merge(api::policies::routes())
        .merge(api::campaigns::routes())
        .merge(api::media::routes())
        .merge(api::quiz::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
