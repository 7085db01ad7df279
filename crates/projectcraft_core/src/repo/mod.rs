//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the flat key-value contract the persistence services rely on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Values are opaque JSON text at this layer; typed decoding happens in the
//!   `*_json` helpers and reports corrupt rows as `InvalidData`.
//! - Batched writes are all-or-nothing.

pub mod keys;
pub mod kv_repo;
