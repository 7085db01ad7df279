//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, lifecycle and repository calls into engine APIs.
//! - Keep callers decoupled from storage details.

pub mod engine;
pub mod persistence;
pub mod snapshot_service;
