//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `projectcraft_core` linkage.
//! - Drive one create, edit, save and snapshot cycle on an in-memory store.
//! - Keep output deterministic apart from generated ids.
//!
//! Set `PROJECTCRAFT_LOG_DIR` to an absolute path to capture core logs.

use log::info;
use projectcraft_core::{
    default_log_level, init_logging, open_db_in_memory, EngineConfig, ProjectEngine,
    SqliteKeyValueStore, SystemClock, TaskPatch,
};
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = std::env::var_os("PROJECTCRAFT_LOG_DIR") {
        init_logging(default_log_level(), &PathBuf::from(log_dir))?;
    }

    println!("projectcraft_core ping={}", projectcraft_core::ping());
    println!(
        "projectcraft_core version={}",
        projectcraft_core::core_version()
    );

    let conn = open_db_in_memory()?;
    let mut engine = ProjectEngine::new(
        SqliteKeyValueStore::new(&conn),
        SystemClock,
        EngineConfig::default(),
    );
    engine.create_project(Some("Smoke"));
    if let Some(task_id) = engine.create_task(TaskPatch::named("Kickoff")) {
        engine.update_task(
            task_id,
            TaskPatch {
                progress: Some(50),
                ..TaskPatch::default()
            },
        );
    }

    let saved = engine.save()?;
    let snapshots = engine.snapshots()?;
    info!(
        "event=cli_smoke module=cli status=ok snapshots={}",
        snapshots.len()
    );

    println!("project state={:?}", engine.current_state());
    println!("tasks={} undo={}", engine.tasks().len(), engine.history().undo_len());
    println!("archive={} members={}", saved.file_path, saved.archive.member_names().count());
    println!("snapshots={}", snapshots.len());
    Ok(())
}
