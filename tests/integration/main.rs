// Single integration test binary.
// Every test gets its own migrated SQLite database in a temp directory.

#[macro_use]
mod common;

mod test_database;
mod test_fixture;
mod test_migrations;
mod test_redirects;
mod test_requests;
