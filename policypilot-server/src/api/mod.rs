//! HTTP API handlers

pub mod campaigns;
pub mod health;
pub mod me;
pub mod media;
pub mod policies;
pub mod quiz;
