//! Project document domain model.
//!
//! # Responsibility
//! - Define the project descriptor and the four entity kinds it owns.
//! - Define the partial-update (`*Patch`) shapes used for create and edit.
//! - Define snapshot and recent-file records shared by persistence.
//!
//! # Invariants
//! - Every entity is identified by an engine-generated, never-reused `EntityId`.
//! - Cross-entity references are plain ids; dangling references are legal.

use uuid::Uuid;

pub mod compat;
pub mod cost;
pub mod document;
pub mod project;
pub mod recent;
pub mod resource;
pub mod risk;
pub mod snapshot;
pub mod task;

/// Identifier shared by tasks, resources, costs and risks.
pub type EntityId = Uuid;
