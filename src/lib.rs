//! In-process controller testing for actix-web applications.
//!
//! A [`TestClient`] dispatches requests to an initialized actix-web service,
//! follows redirects up to a configurable hop cap and keeps the captured
//! response for the assertion helpers. [`ControllerFixture`] adds a SQLite
//! pool for database assertions, and [`MigrationRunner`] applies embedded
//! migrations once per process before seeding.

pub mod assertions;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod fixture;
pub mod history;
pub mod http;
pub mod logging;
pub mod migration;
pub mod redirect;

pub use client::TestClient;
pub use config::HarnessConfig;
pub use db::{Condition, DbPool, initialize_db_pool};
pub use error::{HarnessError, HarnessResult};
pub use fixture::ControllerFixture;
pub use http::{ActixDispatcher, CapturedResponse, RequestContext, RequestDispatcher};
pub use migration::{MigrationRunner, RollbackOrder, RollbackOutcome, Seed};
