use super::*;

fn sample() -> PluginName {
    PluginName::new("Sample")
}

fn seeded() -> MigrationDb {
    let db = MigrationDb::open_memory().unwrap();
    db.record_applied(&sample(), 1, "M1").unwrap();
    db.record_applied(&sample(), 3, "M3").unwrap();
    db.record_applied(&sample(), 2, "M2").unwrap();
    db.record_applied(&PluginName::new("Other"), 1, "O1").unwrap();
    db
}

#[test]
fn record_applied_assigns_distinct_ids() {
    let db = MigrationDb::open_memory().unwrap();
    let a = db.record_applied(&sample(), 1, "M1").unwrap();
    let b = db.record_applied(&sample(), 2, "M2").unwrap();
    assert_ne!(a, b);
}

#[test]
fn record_applied_rejects_second_record_for_version() {
    let db = MigrationDb::open_memory().unwrap();
    db.record_applied(&sample(), 1, "M1").unwrap();
    let err = db.record_applied(&sample(), 1, "M1_again").unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyApplied { version: 1, .. }));
}

#[test]
fn list_applied_is_scoped_and_ascending() {
    let db = seeded();
    let records = db.list_applied(&sample()).unwrap();
    let versions: Vec<i32> = records.iter().map(|r| r.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
    assert!(records.iter().all(|r| r.plugin == "Sample"));
}

#[test]
fn list_applied_unknown_plugin_is_empty() {
    let db = seeded();
    assert!(db
        .list_applied(&PluginName::new("Nope"))
        .unwrap()
        .is_empty());
}

#[test]
fn find_one_matches_exact_triple() {
    let db = seeded();
    let record = db.find_one(&sample(), 2, "M2").unwrap().unwrap();
    assert_eq!(record.name, "M2");
    assert_eq!((&record.plugin, record.version), (&sample(), 2));

    assert!(db.find_one(&sample(), 2, "M2_renamed").unwrap().is_none());
    assert!(db.find_one(&sample(), 9, "M2").unwrap().is_none());
}

#[test]
fn find_one_reports_duplicates() {
    let db = seeded();
    // Bypass record_applied to simulate a corrupted ledger.
    db.conn()
        .execute(
            "INSERT INTO pmig_ledger.plugin_migrations (plugin_name, migration_number, migration_name) VALUES ('Sample', 2, 'M2')",
            [],
        )
        .unwrap();
    match db.find_one(&sample(), 2, "M2") {
        Err(LedgerError::DuplicateRecord { count, .. }) => assert_eq!(count, 2),
        other => panic!("expected DuplicateRecord, got {other:?}"),
    }
}

#[test]
fn get_by_id() {
    let db = MigrationDb::open_memory().unwrap();
    let id = db.record_applied(&sample(), 7, "M7").unwrap();
    let record = db.get(id).unwrap().unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.version, 7);
    assert!(db.get(id + 1000).unwrap().is_none());
}

#[test]
fn applied_at_is_recent() {
    let db = MigrationDb::open_memory().unwrap();
    let id = db.record_applied(&sample(), 1, "M1").unwrap();
    let record = db.get(id).unwrap().unwrap();
    let age = Utc::now().signed_duration_since(record.applied_at);
    assert!(age.num_hours().abs() < 24, "unexpected applied_at {}", record.applied_at);
}

#[test]
fn delete_removes_only_that_record() {
    let db = seeded();
    let record = db.find_one(&sample(), 3, "M3").unwrap().unwrap();
    db.delete(&record).unwrap();

    let versions: Vec<i32> = db
        .list_applied(&sample())
        .unwrap()
        .iter()
        .map(|r| r.version)
        .collect();
    assert_eq!(versions, vec![1, 2]);
    assert_eq!(db.list_applied(&PluginName::new("Other")).unwrap().len(), 1);
}

#[test]
fn delete_twice_is_an_error() {
    let db = seeded();
    let record = db.find_one(&sample(), 1, "M1").unwrap().unwrap();
    db.delete(&record).unwrap();
    let err = db.delete(&record).unwrap_err();
    assert!(matches!(err, LedgerError::RecordNotFound { id } if id == record.id));
}

#[test]
fn list_all_orders_and_excludes() {
    let db = seeded();
    db.record_applied(&PluginName::new("Rock.Core"), 1, "Core1")
        .unwrap();

    let all = db.list_all(&[]).unwrap();
    let keys: Vec<(String, i32)> = all
        .iter()
        .map(|r| (r.plugin.to_string(), r.version))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("Other".to_string(), 1),
            ("Rock.Core".to_string(), 1),
            ("Sample".to_string(), 3),
            ("Sample".to_string(), 2),
            ("Sample".to_string(), 1),
        ]
    );

    let visible = db.list_all(&["Rock".to_string()]).unwrap();
    assert_eq!(visible.len(), 4);
    assert!(visible.iter().all(|r| !r.plugin.starts_with("Rock")));
}
