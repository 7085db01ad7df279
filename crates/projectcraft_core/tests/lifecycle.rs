use chrono::{Duration, TimeZone, Utc};
use projectcraft_core::{
    open_db_in_memory, Clock, EngineConfig, ManualClock, ProjectEngine, ProjectPatch, ProjectState,
    SqliteKeyValueStore, TaskPatch,
};
use rusqlite::Connection;

fn engine(conn: &Connection) -> ProjectEngine<SqliteKeyValueStore<'_>, ManualClock> {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 4, 7, 8, 30, 0).unwrap());
    ProjectEngine::new(SqliteKeyValueStore::new(conn), clock, EngineConfig::default())
}

#[test]
fn create_mutate_save_walks_the_state_machine() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = engine(&conn);
    assert_eq!(engine.current_state(), ProjectState::Uninitialized);

    engine.create_project(None);
    assert_eq!(engine.current_state(), ProjectState::Untitled);
    assert!(engine.project().is_untitled);
    assert!(!engine.is_dirty());

    engine.clock().advance(Duration::minutes(1));
    engine.create_task(TaskPatch::named("Design"));
    assert_eq!(engine.current_state(), ProjectState::Dirty);
    assert!(engine.project().has_unsaved_changes);
    assert_eq!(engine.project().updated_at, engine.clock().now());

    engine.save().unwrap();
    assert_eq!(engine.current_state(), ProjectState::Saved);
    assert!(!engine.is_dirty());
    assert!(engine.project().is_untitled);
}

#[test]
fn save_as_names_the_project_and_clears_untitled() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = engine(&conn);
    engine.create_project(None);
    engine.create_task(TaskPatch::named("Design"));

    let saved = engine.save_as("Harbor").unwrap();

    assert_eq!(saved.file_name, "Harbor");
    assert_eq!(saved.file_path, "Harbor.mpproj");
    assert_eq!(engine.project().name, "Harbor");
    assert!(!engine.project().is_untitled);
    assert_eq!(engine.current_state(), ProjectState::Saved);

    let recent = engine.recent_projects().unwrap();
    assert_eq!(recent.len(), 1);
    assert!(!recent[0].is_temporary);
}

#[test]
fn project_metadata_edit_marks_dirty_without_history() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = engine(&conn);
    engine.create_project(Some("Harbor"));

    engine.update_project(ProjectPatch {
        description: Some("Pier extension".to_string()),
        ..ProjectPatch::default()
    });

    assert_eq!(engine.project().description, "Pier extension");
    assert!(engine.is_dirty());
    assert!(!engine.can_undo());
}

#[test]
fn navigation_check_asks_for_prompt_only_when_dirty() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = engine(&conn);
    engine.create_project(Some("Harbor"));
    assert!(!engine.navigation_check().requires_prompt);

    engine.set_dirty();
    let check = engine.navigation_check();
    assert!(check.requires_prompt);
    assert_eq!(check.state, ProjectState::Dirty);
    assert_eq!(check.name, "Harbor");

    let closing = engine.close_project();
    assert!(closing.requires_prompt);
    assert_eq!(engine.current_state(), ProjectState::Closing);
}

#[test]
fn begin_editing_only_leaves_untitled_or_saved() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = engine(&conn);
    engine.create_project(None);

    assert!(engine.begin_editing());
    assert_eq!(engine.current_state(), ProjectState::Editing);

    engine.set_dirty();
    assert!(!engine.begin_editing());
    assert_eq!(engine.current_state(), ProjectState::Dirty);
}

#[test]
fn discard_reloads_last_saved_document() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = engine(&conn);
    engine.create_project(Some("Harbor"));
    engine.create_task(TaskPatch::named("Design"));
    engine.save().unwrap();

    engine.create_task(TaskPatch::named("Scratch"));
    assert!(engine.is_dirty());

    assert!(engine.discard_changes().unwrap());
    assert_eq!(engine.tasks().len(), 1);
    assert_eq!(engine.tasks()[0].name, "Design");
    assert_eq!(engine.current_state(), ProjectState::Saved);
    assert!(!engine.can_undo());
}

#[test]
fn discard_without_save_reports_nothing_to_reload() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = engine(&conn);
    engine.create_project(None);
    engine.create_task(TaskPatch::named("Scratch"));

    assert!(!engine.discard_changes().unwrap());
    assert_eq!(engine.tasks().len(), 1);
    assert_eq!(engine.current_state(), ProjectState::Dirty);
}
