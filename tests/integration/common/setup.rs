use controller_harness::logging::init_test_logging;
use controller_harness::{DbPool, MigrationRunner, initialize_db_pool};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use tempfile::TempDir;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Migrated SQLite database in a temporary directory.
/// The directory is removed when this is dropped, so keep it alive (_g pattern).
pub struct TestDb {
    pub pool: DbPool,
    pub url: String,
    pub dir: TempDir,
}

pub fn setup_test_db() -> TestDb {
    init_test_logging();

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = dir.path().join("test.sqlite").display().to_string();

    MigrationRunner::new(url.clone(), MIGRATIONS)
        .boot()
        .expect("Failed to run migrations");

    let pool = initialize_db_pool(&url, 2).expect("Failed to create pool");
    TestDb { pool, url, dir }
}
