//! Service layer for policypilot-server

pub mod email;
pub mod files;
pub mod generation;
pub mod idempotency;
pub mod nudges;
pub mod publish;
pub mod quiz_sync;
pub mod rate_limit;
pub mod storage;
