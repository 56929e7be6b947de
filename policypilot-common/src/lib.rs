//! Shared types for PolicyPilot services
//!
//! Carries the error taxonomy, configuration loading, and the domain
//! vocabulary (role tracks, org roles, campaign/assignment states) used by
//! every PolicyPilot crate.

pub mod config;
pub mod error;
pub mod types;

pub use error::{Error, Result};
