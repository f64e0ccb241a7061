use super::*;
use crate::catalog::{CatalogRegistry, MigrationDefinition};
use crate::test_utils::{sample_plugin, sample_site};
use pmig_core::PluginName;
use pmig_ledger::MigrationDb;

fn request(since: i32) -> RollbackRequest {
    RollbackRequest::new(sample_plugin(), since)
}

#[test]
fn test_resolve_includes_since_and_later_descending() {
    let site = sample_site(&[]);
    let plan = resolve(&site.catalog, &site.db, &request(2)).unwrap();
    assert_eq!(plan.versions(), vec![3, 2]);
    assert_eq!(plan.request(), &request(2));
}

#[test]
fn test_resolve_every_applied_version() {
    let site = sample_site(&[]);
    for since in 1..=3 {
        let plan = resolve(&site.catalog, &site.db, &request(since)).unwrap();
        let expected: Vec<i32> = (since..=3).rev().collect();
        assert_eq!(plan.versions(), expected, "since {since}");
    }
}

#[test]
fn test_resolve_skips_unapplied_versions() {
    let site = sample_site(&[]);
    let record = site.db.find_one(&sample_plugin(), 2, "M2").unwrap().unwrap();
    site.db.delete(&record).unwrap();

    let plan = resolve(&site.catalog, &site.db, &request(1)).unwrap();
    assert_eq!(plan.versions(), vec![3, 1]);
}

#[test]
fn test_resolve_skips_applied_records_without_definition() {
    let site = sample_site(&[]);
    site.db.record_applied(&sample_plugin(), 4, "M4").unwrap();

    let plan = resolve(&site.catalog, &site.db, &request(1)).unwrap();
    assert_eq!(plan.versions(), vec![3, 2, 1]);
}

#[test]
fn test_resolve_since_between_versions() {
    let db = MigrationDb::open_memory().unwrap();
    let plugin = PluginName::new("Gaps");
    let mut catalog = CatalogRegistry::new();
    for (version, name) in [(10, "Ten"), (20, "Twenty"), (30, "Thirty")] {
        catalog
            .register(MigrationDefinition::from_sql(plugin.clone(), version, name, "SELECT 1"))
            .unwrap();
        db.record_applied(&plugin, version, name).unwrap();
    }

    let plan = resolve(&catalog, &db, &RollbackRequest::new(plugin.clone(), 15)).unwrap();
    assert_eq!(plan.versions(), vec![30, 20]);

    let plan = resolve(&catalog, &db, &RollbackRequest::new(plugin, 31)).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_resolve_unknown_plugin_is_empty() {
    let site = sample_site(&[]);
    let plan = resolve(
        &site.catalog,
        &site.db,
        &RollbackRequest::new(PluginName::new("Unknown"), 1),
    )
    .unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_resolve_ignores_other_plugins() {
    let site = sample_site(&[]);
    let other = PluginName::new("Other");
    site.db.record_applied(&other, 2, "M2").unwrap();

    let plan = resolve(&site.catalog, &site.db, &request(2)).unwrap();
    assert!(plan.iter().all(|d| d.plugin() == &sample_plugin()));
    assert_eq!(plan.len(), 2);
}

#[test]
fn test_resolve_is_pure() {
    let site = sample_site(&[]);
    let first = resolve(&site.catalog, &site.db, &request(1)).unwrap();
    let second = resolve(&site.catalog, &site.db, &request(1)).unwrap();
    assert_eq!(first, second);
    assert_eq!(site.applied_versions(), vec![1, 2, 3]);
    assert!(site.calls().is_empty());
}

#[test]
fn test_resolve_record_uses_record_version() {
    let site = sample_site(&[]);
    let target = site.db.find_one(&sample_plugin(), 2, "M2").unwrap().unwrap();

    let (record, plan) = resolve_record(&site.catalog, &site.db, target.id).unwrap();
    assert_eq!(record, target);
    assert_eq!(plan.versions(), vec![3, 2]);
}

#[test]
fn test_resolve_record_not_found() {
    let site = sample_site(&[]);
    let err = resolve_record(&site.catalog, &site.db, 9_999).unwrap_err();
    assert!(matches!(err, RollbackError::NotFound { id: 9_999 }));
}
