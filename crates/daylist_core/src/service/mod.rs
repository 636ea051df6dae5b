//! State services.
//!
//! # Responsibility
//! - Orchestrate storage adapter calls into presentation intents.
//! - Keep hosts decoupled from storage details.

pub mod app_store;
pub mod clock;
