use anyhow::Result;
use chrono::Utc;
use std::fs;
use strum::IntoEnumIterator;
use tempfile::TempDir;
use workout_schedule_lib::{
    AppService, Catalog, Config, ConfigError, DeleteOutcome, EditorError, ExercisePatch,
    MemoryStore, Schedule, ScheduleEditor, ScheduleExercise, ScheduleStore, Severity, SqliteStore,
    Weekday, DEFAULT_REPS, DEFAULT_SETS,
};

// Helper function to create a test service with in-memory database.
// The TempDir must outlive the service so config saves have somewhere to go.
fn create_test_service() -> Result<(AppService, TempDir)> {
    let dir = tempfile::tempdir()?;
    let config = Config {
        placeholder_name: "Untitled Plan".to_string(),
        ..Default::default()
    };

    let service = AppService {
        config,
        store: SqliteStore::open_in_memory()?,
        catalog: Catalog::sample(),
        db_path: ":memory:".into(),
        config_path: dir.path().join("config.toml"),
    };
    Ok((service, dir))
}

fn squat() -> workout_schedule_lib::CatalogExercise {
    Catalog::sample().find("Barbell Squat").unwrap().clone()
}

fn entry(id: &str, name: &str) -> ScheduleExercise {
    ScheduleExercise {
        id: id.to_string(),
        name: name.to_string(),
        category: "chest".to_string(),
        image: None,
        sets: DEFAULT_SETS,
        reps: DEFAULT_REPS,
    }
}

/// A stored schedule with `ex1` on Monday and an emptied Tuesday.
fn seeded_store() -> Result<(MemoryStore, String)> {
    let mut schedule = Schedule::new("Upper Body", Utc::now());
    schedule.exercises[Weekday::Monday].push(entry("ex1", "Barbell Bench Press"));
    schedule.exercises[Weekday::Tuesday] = Vec::new();
    // Deliberately stale so save has to recompute it.
    schedule.days = vec![Weekday::Tuesday];
    let id = schedule.id.clone();
    Ok((MemoryStore::with_schedules(&[schedule])?, id))
}

#[test]
fn test_load_selects_first_populated_day() -> Result<()> {
    let mut schedule = Schedule::new("Weekend Warrior", Utc::now());
    schedule.exercises[Weekday::Saturday].push(entry("s1", "Deadlift"));
    schedule.exercises[Weekday::Thursday].push(entry("t1", "Pull-up"));
    let store = MemoryStore::with_schedules(&[schedule.clone()])?;

    let editor = ScheduleEditor::load(&store, &schedule.id)?;
    assert_eq!(editor.selected_day(), Weekday::Thursday);
    assert_eq!(editor.selected_exercises()[0].id, "t1");
    assert!(!editor.is_dirty());

    // Nothing populated -> Monday
    let empty = Schedule::new("Blank", Utc::now());
    let store = MemoryStore::with_schedules(&[empty.clone()])?;
    let editor = ScheduleEditor::load(&store, &empty.id)?;
    assert_eq!(editor.selected_day(), Weekday::Monday);

    Ok(())
}

#[test]
fn test_select_day_switches_visible_list() -> Result<()> {
    let mut schedule = Schedule::new("Split", Utc::now());
    schedule.exercises[Weekday::Monday].push(entry("m1", "Bench Press"));
    schedule.exercises[Weekday::Wednesday].push(entry("w1", "Squat"));
    schedule.exercises[Weekday::Wednesday].push(entry("w2", "Lunge"));
    let store = MemoryStore::with_schedules(&[schedule.clone()])?;

    let mut editor = ScheduleEditor::load(&store, &schedule.id)?;
    editor.select_day(Weekday::Wednesday);
    assert_eq!(editor.selected_day(), Weekday::Wednesday);
    let ids: Vec<&str> = editor
        .selected_exercises()
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(ids, ["w1", "w2"]);

    editor.select_day(Weekday::Sunday);
    assert!(editor.selected_exercises().is_empty());
    // Selecting a day is view state only
    assert!(!editor.is_dirty());
    Ok(())
}

#[test]
fn test_load_missing_id_is_not_found() -> Result<()> {
    let (store, _) = seeded_store()?;
    let result = ScheduleEditor::load(&store, "missing-id");
    match result {
        Err(e @ EditorError::NotFound(_)) => {
            assert_eq!(e.severity(), Severity::Info);
            assert!(!e.is_recoverable());
            assert!(e.to_string().contains("missing-id"));
        }
        Err(other) => panic!("expected NotFound, got {other:?}"),
        Ok(_) => panic!("expected NotFound, got an editor"),
    }
    Ok(())
}

#[test]
fn test_load_from_corrupt_storage_degrades_to_not_found() -> Result<()> {
    let store = MemoryStore::from_raw("[{\"id\": \"abc\", \"name\":");
    let result = ScheduleEditor::load(&store, "abc");
    assert!(matches!(result, Err(EditorError::NotFound(id)) if id == "abc"));
    Ok(())
}

#[test]
fn test_save_recomputes_active_days() -> Result<()> {
    let (store, id) = seeded_store()?;
    let before = Utc::now();

    let mut editor = ScheduleEditor::load(&store, &id)?;
    let saved = editor.save()?.clone();

    assert_eq!(saved.days, vec![Weekday::Monday]);
    assert!(saved.updated_at >= before);
    // Emptied days keep their slot
    assert!(saved.exercises[Weekday::Tuesday].is_empty());

    let stored = store.read_all()?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], saved);
    assert_eq!(store.write_count(), 1);
    Ok(())
}

#[test]
fn test_save_days_invariant_after_edits() -> Result<()> {
    let (store, id) = seeded_store()?;
    let mut editor = ScheduleEditor::load(&store, &id)?;

    editor.add_exercise(Weekday::Sunday, &squat(), None, None);
    editor.add_exercise(Weekday::Wednesday, &squat(), None, None);
    editor.remove_exercise(Weekday::Monday, "ex1");
    editor.save()?;

    for schedule in store.read_all()? {
        let expected: Vec<Weekday> = Weekday::iter()
            .filter(|d| !schedule.exercises[*d].is_empty())
            .collect();
        assert_eq!(schedule.days, expected);
    }
    assert_eq!(
        store.read_all()?[0].days,
        vec![Weekday::Wednesday, Weekday::Sunday]
    );
    Ok(())
}

#[test]
fn test_save_empty_schedule_fails_validation() -> Result<()> {
    let schedule = Schedule::new("Nothing Yet", Utc::now());
    let store = MemoryStore::with_schedules(&[schedule.clone()])?;
    let raw_before = store.raw();

    let mut editor = ScheduleEditor::load(&store, &schedule.id)?;
    let result = editor.save();
    match result {
        Err(e @ EditorError::ValidationFailed(_)) => {
            assert_eq!(e.severity(), Severity::Warning);
            assert!(e.is_recoverable());
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }

    // Store untouched
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.raw(), raw_before);
    Ok(())
}

#[test]
fn test_add_same_exercise_twice_creates_distinct_entries() -> Result<()> {
    let (store, id) = seeded_store()?;
    let mut editor = ScheduleEditor::load(&store, &id)?;
    let catalog_squat = squat();

    let first = editor.add_exercise(Weekday::Wednesday, &catalog_squat, None, None);
    let second = editor.add_exercise(Weekday::Wednesday, &catalog_squat, None, None);

    let wednesday = editor.exercises_for(Weekday::Wednesday);
    assert_eq!(wednesday.len(), 2);
    assert_ne!(first, second);
    assert_ne!(wednesday[0].id, wednesday[1].id);
    assert!(wednesday.iter().all(|e| e.name == "Barbell Squat"));
    assert!(wednesday
        .iter()
        .all(|e| e.sets == DEFAULT_SETS && e.reps == DEFAULT_REPS));
    Ok(())
}

#[test]
fn test_added_exercise_is_a_snapshot() -> Result<()> {
    let (store, id) = seeded_store()?;
    let mut editor = ScheduleEditor::load(&store, &id)?;

    let mut catalog_row = squat();
    editor.add_exercise(Weekday::Friday, &catalog_row, Some(5), Some(5));

    // Later catalog changes don't reach the schedule
    catalog_row.name = "Back Squat".to_string();
    catalog_row.body_part = "legs".to_string();

    let friday = &editor.exercises_for(Weekday::Friday)[0];
    assert_eq!(friday.name, "Barbell Squat");
    assert_eq!(friday.category, "upper legs");
    assert_eq!((friday.sets, friday.reps), (5, 5));
    Ok(())
}

#[test]
fn test_sequential_patches_merge() -> Result<()> {
    let (store, id) = seeded_store()?;
    let mut editor = ScheduleEditor::load(&store, &id)?;

    assert!(editor.update_exercise(Weekday::Monday, "ex1", ExercisePatch::sets(5)));
    assert!(editor.update_exercise(Weekday::Monday, "ex1", ExercisePatch::reps(12)));

    let ex1 = &editor.exercises_for(Weekday::Monday)[0];
    assert_eq!(ex1.sets, 5);
    assert_eq!(ex1.reps, 12);
    assert_eq!(ex1.name, "Barbell Bench Press");
    assert!(editor.is_dirty());
    Ok(())
}

#[test]
fn test_update_is_idempotent() -> Result<()> {
    let (store, id) = seeded_store()?;
    let patch = ExercisePatch {
        sets: Some(4),
        reps: Some(8),
    };

    let mut once = ScheduleEditor::load(&store, &id)?;
    once.update_exercise(Weekday::Monday, "ex1", patch);

    let mut twice = ScheduleEditor::load(&store, &id)?;
    twice.update_exercise(Weekday::Monday, "ex1", patch);
    twice.update_exercise(Weekday::Monday, "ex1", patch);

    assert_eq!(once.schedule(), twice.schedule());
    Ok(())
}

#[test]
fn test_update_unknown_entry_is_noop() -> Result<()> {
    let (store, id) = seeded_store()?;
    let mut editor = ScheduleEditor::load(&store, &id)?;
    let before = editor.schedule().clone();

    // Wrong id, and right id on the wrong day
    assert!(!editor.update_exercise(Weekday::Monday, "nope", ExercisePatch::sets(6)));
    assert!(!editor.update_exercise(Weekday::Tuesday, "ex1", ExercisePatch::sets(6)));

    assert_eq!(editor.schedule(), &before);
    assert!(!editor.is_dirty());
    Ok(())
}

#[test]
fn test_remove_unknown_entry_is_noop() -> Result<()> {
    let (store, id) = seeded_store()?;
    let mut editor = ScheduleEditor::load(&store, &id)?;
    let monday_before = editor.exercises_for(Weekday::Monday).to_vec();

    assert!(!editor.remove_exercise(Weekday::Monday, "not-there"));
    assert_eq!(editor.exercises_for(Weekday::Monday), monday_before.as_slice());

    assert!(editor.remove_exercise(Weekday::Monday, "ex1"));
    assert!(editor.exercises_for(Weekday::Monday).is_empty());
    Ok(())
}

#[test]
fn test_failed_write_keeps_working_copy() -> Result<()> {
    let (store, id) = seeded_store()?;
    let raw_before = store.raw();
    let mut editor = ScheduleEditor::load(&store, &id)?;
    editor.add_exercise(Weekday::Thursday, &squat(), None, None);
    let working_before = editor.schedule().clone();

    store.set_fail_writes(true);
    let result = editor.save();
    match result {
        Err(e @ EditorError::PersistenceFailed(_)) => {
            assert_eq!(e.severity(), Severity::Error);
            assert!(e.is_recoverable());
        }
        other => panic!("expected PersistenceFailed, got {other:?}"),
    }
    assert_eq!(editor.schedule(), &working_before);
    assert_eq!(store.raw(), raw_before);

    // Retry succeeds once storage recovers
    store.set_fail_writes(false);
    let saved = editor.save()?;
    assert_eq!(saved.days, vec![Weekday::Monday, Weekday::Thursday]);
    assert!(!editor.is_dirty());
    Ok(())
}

#[test]
fn test_save_replaces_only_matching_record() -> Result<()> {
    let mut other = Schedule::new("Cardio", Utc::now());
    other.exercises[Weekday::Friday].push(entry("c1", "Jump Rope"));
    other.refresh_days();

    let mut target = Schedule::new("Strength", Utc::now());
    target.exercises[Weekday::Monday].push(entry("m1", "Deadlift"));
    let store = MemoryStore::with_schedules(&[other.clone(), target.clone()])?;

    let mut editor = ScheduleEditor::load(&store, &target.id)?;
    editor.rename("Strength Block")?;
    editor.save()?;

    let stored = store.read_all()?;
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0], other);
    assert_eq!(stored[1].id, target.id);
    assert_eq!(stored[1].name, "Strength Block");
    assert_eq!(stored[1].created_at, target.created_at);
    Ok(())
}

#[test]
fn test_save_after_external_delete_is_not_found() -> Result<()> {
    let (store, id) = seeded_store()?;
    let mut editor = ScheduleEditor::load(&store, &id)?;
    editor.rename("Renamed Elsewhere")?;

    // Another session wipes the list
    store.write_all(&[])?;
    let writes = store.write_count();

    let result = editor.save();
    assert!(matches!(result, Err(EditorError::NotFound(ref missing)) if *missing == id));
    assert!(store.read_all()?.is_empty());
    assert_eq!(store.write_count(), writes);
    assert_eq!(editor.schedule().name, "Renamed Elsewhere");
    Ok(())
}

#[test]
fn test_deleted_schedule_stays_deleted() -> Result<()> {
    let (store, id) = seeded_store()?;
    let mut stale = ScheduleEditor::load(&store, &id)?;
    stale.rename("Still Editing")?;

    let editor = ScheduleEditor::load(&store, &id)?;
    assert!(matches!(
        editor.delete(&mut |_: &str| true),
        Ok(DeleteOutcome::Deleted)
    ));
    assert!(store.read_all()?.is_empty());

    assert!(matches!(stale.save(), Err(EditorError::NotFound(_))));
    assert!(store.read_all()?.is_empty());
    Ok(())
}

#[test]
fn test_rename_rejects_blank_name() -> Result<()> {
    let (store, id) = seeded_store()?;
    let mut editor = ScheduleEditor::load(&store, &id)?;
    assert!(matches!(
        editor.rename("   "),
        Err(EditorError::ValidationFailed(_))
    ));
    assert_eq!(editor.schedule().name, "Upper Body");
    Ok(())
}

#[test]
fn test_delete_requires_confirmation() -> Result<()> {
    let (store, id) = seeded_store()?;
    let editor = ScheduleEditor::load(&store, &id)?;

    let mut prompts = Vec::new();
    let outcome = editor.delete(&mut |message: &str| {
        prompts.push(message.to_string());
        false
    });
    let Ok(DeleteOutcome::Cancelled(editor)) = outcome else {
        panic!("declined delete should hand the editor back");
    };
    assert_eq!(store.write_count(), 0);
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Upper Body"));
    assert_eq!(editor.schedule().id, id);

    let outcome = editor.delete(&mut |_: &str| true);
    assert!(matches!(outcome, Ok(DeleteOutcome::Deleted)));
    assert!(store.read_all()?.is_empty());
    assert!(matches!(
        ScheduleEditor::load(&store, &id),
        Err(EditorError::NotFound(_))
    ));
    Ok(())
}

#[test]
fn test_delete_reports_persistence_failure() -> Result<()> {
    let (store, id) = seeded_store()?;
    let editor = ScheduleEditor::load(&store, &id)?;
    store.set_fail_writes(true);

    let Err((editor, error)) = editor.delete(&mut |_: &str| true) else {
        panic!("delete should fail while writes are rejected");
    };
    assert!(matches!(error, EditorError::PersistenceFailed(_)));
    assert_eq!(store.read_all()?.len(), 1);

    // The returned editor can retry once storage recovers
    store.set_fail_writes(false);
    assert!(matches!(
        editor.delete(&mut |_: &str| true),
        Ok(DeleteOutcome::Deleted)
    ));
    assert!(store.read_all()?.is_empty());
    Ok(())
}

#[test]
fn test_round_trip_is_stable() -> Result<()> {
    let (service, _dir) = create_test_service()?;
    let first = service.create_schedule(Some("A"))?;
    service.add_to_schedule(&first.id, Weekday::Monday, "Push-up", None, Some(20))?;
    service.create_schedule(Some("B"))?;

    let raw_before = service.store.raw()?;
    let schedules = service.store.read_all()?;
    service.store.write_all(&schedules)?;
    assert_eq!(service.store.raw()?, raw_before);
    Ok(())
}

#[test]
fn test_create_and_list_schedules() -> Result<()> {
    let (service, _dir) = create_test_service()?;
    assert!(service.list_schedules()?.is_empty());

    let named = service.create_schedule(Some("  Push Pull Legs "))?;
    let unnamed = service.create_schedule(None)?;
    let blank = service.create_schedule(Some(""))?;

    assert_eq!(named.name, "Push Pull Legs");
    assert_eq!(unnamed.name, "Untitled Plan");
    assert_eq!(blank.name, "Untitled Plan");
    assert_ne!(named.id, unnamed.id);
    assert_eq!(named.created_at, named.updated_at);
    assert!(named.days.is_empty());

    let listed = service.list_schedules()?;
    let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![named.id.as_str(), unnamed.id.as_str(), blank.id.as_str()]);
    Ok(())
}

#[test]
fn test_add_to_schedule_uses_configured_defaults() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;
    service.set_default_sets(4)?;
    service.set_default_reps(15)?;
    let schedule = service.create_schedule(Some("Defaults"))?;

    let entry_id = service.add_to_schedule(&schedule.id, Weekday::Tuesday, "0006", None, None)?;
    let explicit =
        service.add_to_schedule(&schedule.id, Weekday::Tuesday, "pull-up", Some(2), None)?;

    let editor = service.open_editor(&schedule.id)?;
    let tuesday = editor.exercises_for(Weekday::Tuesday);
    assert_eq!(tuesday.len(), 2);
    assert_eq!(tuesday[0].id, entry_id);
    assert_eq!((tuesday[0].sets, tuesday[0].reps), (4, 15));
    assert_eq!(tuesday[1].id, explicit);
    assert_eq!((tuesday[1].sets, tuesday[1].reps), (2, 15));
    assert_eq!(editor.schedule().days, vec![Weekday::Tuesday]);
    assert_eq!(editor.selected_day(), Weekday::Tuesday);
    Ok(())
}

#[test]
fn test_add_to_schedule_errors() -> Result<()> {
    let (service, _dir) = create_test_service()?;
    let schedule = service.create_schedule(None)?;

    let unknown_exercise =
        service.add_to_schedule(&schedule.id, Weekday::Monday, "Zumba", None, None);
    assert!(unknown_exercise
        .unwrap_err()
        .to_string()
        .contains("is not in the catalog"));

    let missing_schedule =
        service.add_to_schedule("missing-id", Weekday::Monday, "Plank", None, None);
    let err = missing_schedule.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EditorError>(),
        Some(EditorError::NotFound(_))
    ));

    assert!(service.find_catalog_exercise("  ").is_err());
    Ok(())
}

#[test]
fn test_catalog_search_through_service() -> Result<()> {
    let (service, _dir) = create_test_service()?;
    assert_eq!(service.search_catalog("").len(), service.catalog.len());

    let chest: Vec<&str> = service
        .search_catalog("Chest")
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    // body part matches plus Triceps Dip via its secondary muscles
    assert_eq!(chest, vec!["Barbell Bench Press", "Push-up", "Triceps Dip"]);
    Ok(())
}

#[test]
fn test_config_operations() -> Result<()> {
    let (mut service, _dir) = create_test_service()?;

    service.set_confirm_delete(false)?;
    service.set_default_sets(6)?;
    let reloaded = workout_schedule_lib::load_config_util(service.get_config_path())?;
    assert!(!reloaded.confirm_delete);
    assert_eq!(reloaded.default_sets, 6);
    assert_eq!(reloaded.placeholder_name, "Untitled Plan");

    let result = service.set_default_reps(7);
    assert!(matches!(result, Err(ConfigError::InvalidDefaultReps(7))));
    assert_eq!(service.config.default_reps, DEFAULT_REPS);
    Ok(())
}

#[test]
fn test_catalog_path_from_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog_path = dir.path().join("catalog.json");
    fs::write(
        &catalog_path,
        r#"[{
            "id": "k1",
            "name": "Kettlebell Swing",
            "bodyPart": "upper legs",
            "equipment": "kettlebell",
            "target": "glutes",
            "secondaryMuscles": []
        }]"#,
    )?;

    let config = Config {
        catalog_path: Some(catalog_path),
        ..Default::default()
    };
    let catalog = workout_schedule_lib::load_catalog(&config)?;
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.find("kettlebell swing").map(|e| e.id.as_str()), Some("k1"));

    let missing = Config {
        catalog_path: Some(dir.path().join("nope.json")),
        ..Default::default()
    };
    assert!(workout_schedule_lib::load_catalog(&missing).is_err());
    Ok(())
}

#[test]
fn test_sqlite_store_persists_across_connections() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("data").join("schedules.sqlite");

    let id = {
        let conn = workout_schedule_lib::db::open_db(&db_path)?;
        let store = SqliteStore::new(conn)?;
        let mut schedule = Schedule::new("On Disk", Utc::now());
        schedule.exercises[Weekday::Monday].push(entry("d1", "Deadlift"));
        schedule.refresh_days();
        store.write_all(&[schedule.clone()])?;
        schedule.id
    };

    let conn = workout_schedule_lib::db::open_db(&db_path)?;
    let store = SqliteStore::new(conn)?;
    let editor = ScheduleEditor::load(&store, &id)?;
    assert_eq!(editor.schedule().name, "On Disk");
    assert_eq!(editor.schedule().days, vec![Weekday::Monday]);
    Ok(())
}
