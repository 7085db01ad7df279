use chrono::{Duration, NaiveDate, TimeZone, Utc};
use projectcraft_core::archive::layout::{MANIFEST_MEMBER, PROJECT_MEMBER};
use projectcraft_core::{
    open_db_in_memory, ArchiveError, CostCategory, CostPatch, EngineConfig, ManualClock,
    PersistenceError, ProjectArchive, ProjectEngine, ProjectState, RecentProject, ResourcePatch,
    ResourceType, RiskPatch, SnapshotKind, SqliteKeyValueStore, TaskPatch, WeeklySchedule,
};
use rusqlite::Connection;
use std::io::Write;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

type Engine<'conn> = ProjectEngine<SqliteKeyValueStore<'conn>, ManualClock>;

fn engine_with(conn: &Connection, config: EngineConfig) -> Engine<'_> {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap());
    ProjectEngine::new(SqliteKeyValueStore::new(conn), clock, config)
}

fn populated(conn: &Connection, config: EngineConfig) -> Engine<'_> {
    let mut engine = engine_with(conn, config);
    engine.create_project(Some("Harbor"));
    let survey = engine.create_task(TaskPatch::named("Survey")).unwrap();
    engine.create_task(TaskPatch {
        parent_id: Some(Some(survey)),
        progress: Some(30),
        ..TaskPatch::named("Soundings")
    });
    engine.create_resource(ResourcePatch {
        kind: Some(ResourceType::Equipment),
        available_hours: Some(WeeklySchedule {
            sat: 4,
            ..WeeklySchedule::default()
        }),
        calendar: Some(vec![NaiveDate::from_ymd_opt(2025, 6, 9).unwrap()]),
        rate_per_hour: Some(85.5),
        ..ResourcePatch::named("Barge")
    });
    engine.create_cost(CostPatch {
        task_id: Some(Some(survey)),
        amount: Some(12000.0),
        category: Some(CostCategory::Equipment),
        ..CostPatch::default()
    });
    engine.create_risk(RiskPatch::titled("Storm season"));
    engine
}

#[test]
fn saved_archive_imports_to_equal_collections() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = populated(&conn, EngineConfig::default());
    let original = engine.document().clone();
    let saved = engine.save().unwrap();

    let other_conn = open_db_in_memory().unwrap();
    let mut other = engine_with(&other_conn, EngineConfig::default());
    let project_id = other.import_archive(&saved.archive).unwrap();

    assert_eq!(project_id, original.project.id);
    assert!(other.document().same_entities(&original));
    assert_eq!(other.project().name, "Harbor");
    assert_eq!(other.current_state(), ProjectState::Saved);
    assert!(!other.project().is_untitled);
    assert_eq!(other.recent_projects().unwrap()[0].project_uuid, project_id);
}

#[test]
fn archive_file_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::default().with_archive_root(dir.path());
    let mut engine = populated(&conn, config);
    let original = engine.document().clone();

    let saved = engine.save().unwrap();
    let archive_path = dir.path().join("Harbor.mpproj");
    assert_eq!(saved.file_path, archive_path.display().to_string());
    assert!(archive_path.is_file());
    assert_eq!(ProjectArchive::read_from_file(&archive_path).unwrap(), saved.archive);

    let other_conn = open_db_in_memory().unwrap();
    let mut other = engine_with(&other_conn, EngineConfig::default());
    other.import_path(&archive_path).unwrap();

    assert!(other.document().same_entities(&original));
    assert_eq!(
        other.recent_projects().unwrap()[0].file_path,
        archive_path.display().to_string()
    );
}

#[test]
fn load_returns_flat_copy_and_unknown_id_returns_false() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = populated(&conn, EngineConfig::default());
    let original = engine.document().clone();
    engine.save().unwrap();

    engine.create_project(None);
    assert!(engine.document().is_empty());

    assert!(!engine.load_project(Uuid::new_v4()).unwrap());
    assert!(engine.document().is_empty());

    assert!(engine.load_project(original.project.id).unwrap());
    assert!(engine.document().same_entities(&original));
    assert_eq!(engine.current_state(), ProjectState::Saved);
    assert!(!engine.can_undo());
}

#[test]
fn raw_json_document_imports() {
    let conn = open_db_in_memory().unwrap();
    let source = populated(&conn, EngineConfig::default());
    let raw = serde_json::to_string(source.document()).unwrap();

    let other_conn = open_db_in_memory().unwrap();
    let mut other = engine_with(&other_conn, EngineConfig::default());
    other.import_json(&raw).unwrap();

    assert!(other.document().same_entities(source.document()));
    assert_eq!(other.current_state(), ProjectState::Saved);
    assert!(!other.is_dirty());
}

#[test]
fn raw_json_file_imports_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db_in_memory().unwrap();
    let source = populated(&conn, EngineConfig::default());
    let path = dir.path().join("harbor.json");
    std::fs::write(&path, serde_json::to_vec(source.document()).unwrap()).unwrap();

    let other_conn = open_db_in_memory().unwrap();
    let mut other = engine_with(&other_conn, EngineConfig::default());
    other.import_path(&path).unwrap();

    assert_eq!(other.tasks().len(), 2);
    assert_eq!(other.resources()[0].rate_per_hour, 85.5);
}

#[test]
fn malformed_imports_change_nothing() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = populated(&conn, EngineConfig::default());
    let saved = engine.save().unwrap();
    let before = engine.document().clone();
    let recent_before = engine.recent_projects().unwrap();

    let mut missing_project = saved.archive.clone();
    missing_project.remove(PROJECT_MEMBER);
    assert!(matches!(
        engine.import_archive(&missing_project),
        Err(PersistenceError::Archive(ArchiveError::MissingMember(_)))
    ));

    let mut missing_field = saved.archive.clone();
    missing_field.insert(
        PROJECT_MEMBER,
        br#"{"project_name":"Harbor","end_date":"2025-07-01T00:00:00Z"}"#.to_vec(),
    );
    assert!(matches!(
        engine.import_archive(&missing_field),
        Err(PersistenceError::Archive(ArchiveError::MissingField {
            field: "start_date",
            ..
        }))
    ));

    let mut future = saved.archive.clone();
    future.insert(
        MANIFEST_MEMBER,
        format!(
            r#"{{"project_uuid":"{}","file_version":"3.1.0"}}"#,
            Uuid::new_v4()
        )
        .into_bytes(),
    );
    assert!(matches!(
        engine.import_archive(&future),
        Err(PersistenceError::Archive(ArchiveError::UnsupportedVersion(_)))
    ));

    assert!(matches!(
        engine.import_json("{ not json"),
        Err(PersistenceError::Malformed(_))
    ));

    assert_eq!(engine.document(), &before);
    assert_eq!(engine.recent_projects().unwrap(), recent_before);
}

#[test]
fn recent_list_deduplicates_by_project_and_keeps_latest_first() {
    let conn = open_db_in_memory().unwrap();
    let engine = engine_with(&conn, EngineConfig::default());
    let project_uuid = Uuid::new_v4();
    let first_seen = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
    let entry = |opened_at| RecentProject {
        file_name: "Harbor".to_string(),
        file_path: "Harbor.mpproj".to_string(),
        opened_at,
        project_uuid,
        is_temporary: false,
    };

    engine
        .add_recent_project(RecentProject {
            project_uuid: Uuid::new_v4(),
            ..entry(first_seen)
        })
        .unwrap();
    engine.add_recent_project(entry(first_seen)).unwrap();
    engine
        .add_recent_project(entry(first_seen + Duration::hours(2)))
        .unwrap();

    let recent = engine.recent_projects().unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].project_uuid, project_uuid);
    assert_eq!(recent[0].opened_at, first_seen + Duration::hours(2));
}

#[test]
fn recent_list_is_bounded_to_ten() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = engine_with(&conn, EngineConfig::default());
    for index in 0..12 {
        let name = format!("project-{index}");
        engine.create_project(Some(name.as_str()));
        engine.save().unwrap();
    }

    let recent = engine.recent_projects().unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].file_name, "project-11");
}

#[test]
fn fractional_amounts_survive_every_storage_path() {
    let conn = open_db_in_memory().unwrap();
    let mut engine = engine_with(&conn, EngineConfig::default());
    engine.create_project(Some("Ledger"));
    let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
    for index in 0..400u32 {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let amount = (seed >> 11) as f64 / 9_973.0 + 0.1 + 0.2;
        engine.create_cost(CostPatch {
            amount: Some(amount),
            ..CostPatch::default()
        });
        if index % 8 == 0 {
            engine.create_resource(ResourcePatch {
                rate_per_hour: Some(1.0 / f64::from(index + 3) + amount.fract()),
                ..ResourcePatch::named(format!("crew-{index}"))
            });
        }
    }
    let expected = engine.document().clone();
    let saved = engine.save().unwrap();

    let other_conn = open_db_in_memory().unwrap();
    let mut other = engine_with(&other_conn, EngineConfig::default());
    other.import_archive(&saved.archive).unwrap();
    assert_eq!(other.costs(), expected.costs.as_slice());
    assert_eq!(other.resources(), expected.resources.as_slice());

    engine.create_project(None);
    assert!(engine.load_project(expected.project.id).unwrap());
    assert_eq!(engine.costs(), expected.costs.as_slice());

    let snapshot = engine.latest_snapshot(SnapshotKind::Manual).unwrap().unwrap();
    let restored = engine.restore_snapshot(&snapshot.id).unwrap().unwrap();
    assert_eq!(restored.costs, expected.costs);
    assert_eq!(restored.resources, expected.resources);
}

const DESKTOP_TASK_ID: &str = "0b6f3a52-8d0e-4d7c-9a6b-3f1e2d4c5b6a";

fn desktop_tasks() -> String {
    format!(
        r#"[{{"id":"{DESKTOP_TASK_ID}","name":"Site survey","parentId":null,
            "startDate":"2025-06-02","endDate":"2025-06-05","duration":3,"progress":20,
            "assigneeIds":[],"dependencies":[],"type":"standard","notes":"","order":0}}]"#
    )
}

fn desktop_costs() -> &'static str {
    r#"[{"id":"5d2c1b0a-9e8f-4a7b-8c6d-5e4f3a2b1c0d","taskId":"","amount":1999.99,
        "category":"人事","currency":"TWD","date":"2025-06-03T00:00:00.000Z",
        "invoiceId":"","status":"pending","note":""},
       {"id":"6e3d2c1b-0a9f-4b8c-9d7e-6f5a4b3c2d1e","taskId":"0b6f3a52-8d0e-4d7c-9a6b-3f1e2d4c5b6a",
        "amount":12.5,"category":"設備","currency":"TWD","date":"2025-06-04",
        "invoiceId":"INV-7","status":"paid","note":""}]"#
}

fn desktop_risks() -> &'static str {
    r#"[{"id":"7f4e3d2c-1b0a-4c9d-8e7f-7a6b5c4d3e2f","taskId":"","identifiedAt":"2025-06-02",
        "title":"Tide window","description":"","impactLevel":"high","probability":"low",
        "mitigationPlan":"","status":"open"}]"#
}

#[test]
fn desktop_app_json_document_imports() {
    let raw = format!(
        r#"{{"project":{{"id":"{}","name":"Pier","description":"","createdAt":"2025-06-01T08:00:00.000Z",
            "updatedAt":"2025-06-01T08:00:00.000Z","startDate":"2025-06-01T08:00:00.000Z",
            "endDate":"2025-07-01T08:00:00.000Z","createdBy":"User","currentState":"DIRTY",
            "hasUnsavedChanges":true,"isUntitled":false}},
          "tasks":{},"resources":[],"costs":{},"risks":{}}}"#,
        Uuid::new_v4(),
        desktop_tasks(),
        desktop_costs(),
        desktop_risks()
    );

    let conn = open_db_in_memory().unwrap();
    let mut engine = engine_with(&conn, EngineConfig::default());
    engine.import_json(&raw).unwrap();

    let task_id = Uuid::parse_str(DESKTOP_TASK_ID).unwrap();
    assert_eq!(
        engine.task(task_id).unwrap().start_date,
        Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
    );
    let costs = engine.costs();
    assert_eq!(costs[0].task_id, None);
    assert_eq!(costs[0].category, CostCategory::Personnel);
    assert_eq!(costs[1].task_id, Some(task_id));
    assert_eq!(costs[1].category, CostCategory::Equipment);
    assert_eq!(engine.risks()[0].task_id, None);
    assert_eq!(engine.current_state(), ProjectState::Saved);
}

#[test]
fn desktop_app_zip_archive_imports_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Pier.mpproj");
    let project_uuid = Uuid::new_v4();
    let members = [
        (
            "manifest.json",
            format!(
                r#"{{"project_uuid":"{project_uuid}","file_version":"1.0.0",
                    "created_platform":"Win32","created_with_version":"0.1.0"}}"#
            ),
        ),
        (
            "project.json",
            r#"{"project_name":"Pier","description":"","created_by":"User",
                "start_date":"2025-06-01T08:00:00.000Z","end_date":"2025-07-01T08:00:00.000Z"}"#
                .to_string(),
        ),
        ("tasks.json", desktop_tasks()),
        ("resources.json", "[]".to_string()),
        ("cost.json", desktop_costs().to_string()),
        ("risklog.json", desktop_risks().to_string()),
        (
            "schedule.json",
            r#"{"baseline":[],"actual":[],"deviation":[]}"#.to_string(),
        ),
        ("meta/log.txt", "Project created: 2025-06-01T08:00:00.000Z".to_string()),
    ];
    let mut writer = ZipWriter::new(std::fs::File::create(&path).unwrap());
    for (name, content) in &members {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.add_directory("attachments/", SimpleFileOptions::default()).unwrap();
    writer.finish().unwrap();

    let conn = open_db_in_memory().unwrap();
    let mut engine = engine_with(&conn, EngineConfig::default());
    assert_eq!(engine.import_path(&path).unwrap(), project_uuid);

    assert_eq!(engine.project().name, "Pier");
    assert_eq!(engine.tasks().len(), 1);
    assert_eq!(engine.costs()[0].amount, 1999.99);
    assert_eq!(
        engine.recent_projects().unwrap()[0].file_path,
        path.display().to_string()
    );
}
