use controller_harness::db::count_rows;
use controller_harness::{Condition, HarnessConfig, MigrationRunner, RollbackOrder, Seed};
use diesel::{Connection, SqliteConnection};

use crate::common::*;

fn users(url: &str) -> i64 {
    let mut conn = SqliteConnection::establish(url).unwrap();
    count_rows(&mut conn, "users", &Condition::none()).unwrap()
}

#[test]
fn test_setup_already_booted_database_only_seeds() {
    let db = setup_test_db();
    let seed_path = db.dir.path().join("seed_users.sql");
    std::fs::write(
        &seed_path,
        "INSERT INTO users (username, password) VALUES ('seeded', 'x');",
    )
    .unwrap();

    let report = MigrationRunner::new(db.url.clone(), MIGRATIONS)
        .with_seed(Seed::from_file(&seed_path).unwrap())
        .boot()
        .unwrap();

    assert!(report.already_booted);
    assert!(report.applied.is_empty());
    assert_eq!(report.seeded, vec!["seed_users".to_string()]);
    assert_eq!(users(&db.url), 1);
}

#[test]
fn test_runner_from_config_rolls_back_through_shell() {
    let db = setup_test_db();
    let out = tempfile::tempdir().unwrap();

    let mut config = HarnessConfig::default();
    config.database_url = Some(db.url.clone());
    config.migration.rollback_command = Some("echo 123 > ".to_string());
    config.migration.bin_dir = out.path().to_path_buf();
    config.migration.rollback_order = RollbackOrder::Reverse;

    let runner = MigrationRunner::from_config(&config, MIGRATIONS).unwrap();
    let outcome = runner.rollback().unwrap();

    assert!(outcome.performed());
    assert!(outcome.all_succeeded());
    let identifiers: Vec<&str> = outcome.steps().iter().map(|s| s.identifier.as_str()).collect();
    assert_eq!(identifiers.len(), 2);
    assert!(identifiers[0].contains("create_items"));
    for step in outcome.steps() {
        let written = std::fs::read_to_string(out.path().join(&step.identifier)).unwrap();
        assert_eq!(written, "123\n");
    }
}

#[test]
fn test_rollback_without_command_returns_not_performed() {
    let db = setup_test_db();
    let outcome = MigrationRunner::new(db.url.clone(), MIGRATIONS)
        .rollback()
        .unwrap();
    assert!(!outcome.performed());
    assert!(outcome.steps().is_empty());
}
