//! One-time migration runner with seeds and command-driven rollback.
//!
//! Migrations are applied at most once per process for a given database URL;
//! seeds run on every boot. Rollback shells out once per migration unit.

mod rollback;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{LazyLock, Mutex};

use diesel::connection::SimpleConnection;
use diesel::migration::MigrationSource;
use diesel::sqlite::Sqlite;
use diesel::{Connection, SqliteConnection};
use diesel_migrations::MigrationHarness;

pub use rollback::{
    ProcessInvoker, ProcessOutput, RollbackOutcome, RollbackStep, ShellInvoker,
    rollback_command_line,
};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};

/// Database URLs already migrated by this process.
static BOOTED: LazyLock<Mutex<HashSet<String>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

fn booted() -> HarnessResult<std::sync::MutexGuard<'static, HashSet<String>>> {
    BOOTED
        .lock()
        .map_err(|_| HarnessError::Migration("migration guard poisoned".to_string()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RollbackOrder {
    #[default]
    Declared,
    Reverse,
}

impl RollbackOrder {
    pub fn arrange<T>(self, items: &mut [T]) {
        if self == RollbackOrder::Reverse {
            items.reverse();
        }
    }
}

impl FromStr for RollbackOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "declared" => Ok(RollbackOrder::Declared),
            "reverse" => Ok(RollbackOrder::Reverse),
            other => Err(format!(
                "unknown rollback order '{}', expected 'declared' or 'reverse'",
                other
            )),
        }
    }
}

impl fmt::Display for RollbackOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackOrder::Declared => write!(f, "declared"),
            RollbackOrder::Reverse => write!(f, "reverse"),
        }
    }
}

/// SQL applied after migrations on every boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    name: String,
    sql: String,
}

impl Seed {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }

    /// Load a seed from a SQL file, named after the file stem.
    pub fn from_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let sql = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, sql })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootReport {
    /// Migrations applied by this boot, in order
    pub applied: Vec<String>,
    /// Seeds applied by this boot, in order
    pub seeded: Vec<String>,
    /// Migrations were skipped because this process already ran them
    pub already_booted: bool,
}

pub struct MigrationRunner<S> {
    source: S,
    database_url: String,
    seeds: Vec<Seed>,
    rollback_command: Option<String>,
    bin_dir: PathBuf,
    order: RollbackOrder,
    invoker: Box<dyn ProcessInvoker>,
}

impl<S: MigrationSource<Sqlite>> MigrationRunner<S> {
    pub fn new(database_url: impl Into<String>, source: S) -> Self {
        Self {
            source,
            database_url: database_url.into(),
            seeds: Vec::new(),
            rollback_command: None,
            bin_dir: PathBuf::from("bin"),
            order: RollbackOrder::default(),
            invoker: Box::new(ShellInvoker),
        }
    }

    pub fn from_config(config: &HarnessConfig, source: S) -> HarnessResult<Self> {
        let database_url = config.database_url.clone().ok_or_else(|| {
            HarnessError::Migration("HARNESS_DATABASE_URL is not set".to_string())
        })?;
        let mut runner = Self::new(database_url, source);
        runner.rollback_command = config.migration.rollback_command.clone();
        runner.bin_dir = config.migration.bin_dir.clone();
        runner.order = config.migration.rollback_order;
        Ok(runner)
    }

    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seeds.push(seed);
        self
    }

    pub fn with_seeds(mut self, seeds: impl IntoIterator<Item = Seed>) -> Self {
        self.seeds.extend(seeds);
        self
    }

    pub fn with_rollback_command(mut self, command: impl Into<String>) -> Self {
        self.rollback_command = Some(command.into());
        self
    }

    pub fn with_bin_dir(mut self, bin_dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = bin_dir.into();
        self
    }

    pub fn with_rollback_order(mut self, order: RollbackOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_invoker(mut self, invoker: impl ProcessInvoker + 'static) -> Self {
        self.invoker = Box::new(invoker);
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    pub fn rollback_command(&self) -> Option<&str> {
        self.rollback_command.as_deref()
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn rollback_order(&self) -> RollbackOrder {
        self.order
    }

    /// Whether this process has already migrated the runner's database.
    pub fn is_booted(&self) -> HarnessResult<bool> {
        Ok(booted()?.contains(&self.database_url))
    }

    fn connect(&self) -> HarnessResult<SqliteConnection> {
        SqliteConnection::establish(&self.database_url).map_err(|e| {
            HarnessError::Migration(format!("failed to connect to {}: {}", self.database_url, e))
        })
    }

    /// Migration unit identifiers in declared (version) order.
    pub fn migration_identifiers(&self) -> HarnessResult<Vec<String>> {
        let mut migrations = self
            .source
            .migrations()
            .map_err(|e| HarnessError::Migration(e.to_string()))?;
        migrations.sort_by_key(|m| m.name().version().to_string());
        Ok(migrations.iter().map(|m| m.name().to_string()).collect())
    }

    /// Apply pending migrations once per process, then every seed.
    pub fn boot(&self) -> HarnessResult<BootReport> {
        let mut conn = self.connect()?;
        let mut report = BootReport::default();

        {
            // Held across the run so concurrent boots of one database serialize
            let mut booted = booted()?;
            if booted.contains(&self.database_url) {
                log::debug!("Migrations already applied to {}", self.database_url);
                report.already_booted = true;
            } else {
                report.applied = self.run_pending(&mut conn)?;
                booted.insert(self.database_url.clone());
            }
        }

        for seed in &self.seeds {
            conn.batch_execute(seed.sql())?;
            log::info!("Applied seed {}", seed.name());
            report.seeded.push(seed.name().to_string());
        }

        Ok(report)
    }

    fn run_pending(&self, conn: &mut SqliteConnection) -> HarnessResult<Vec<String>> {
        let applied: HashSet<String> = conn
            .applied_migrations()
            .map_err(|e| HarnessError::Migration(e.to_string()))?
            .iter()
            .map(|version| version.to_string())
            .collect();

        let mut pending = self
            .source
            .migrations()
            .map_err(|e| HarnessError::Migration(e.to_string()))?;
        pending.retain(|m| !applied.contains(&m.name().version().to_string()));
        pending.sort_by_key(|m| m.name().version().to_string());

        let mut names = Vec::with_capacity(pending.len());
        for migration in &pending {
            let name = migration.name().to_string();
            conn.run_migration(&**migration).map_err(|e| {
                HarnessError::Migration(format!("failed to run migration {}: {}", name, e))
            })?;
            log::info!("Applied migration {}", name);
            names.push(name);
        }
        Ok(names)
    }

    /// Invoke the rollback command once per migration unit.
    ///
    /// Without a configured command nothing runs and the outcome reports
    /// `performed() == false`. A completed rollback lets the next `boot`
    /// migrate again.
    pub fn rollback(&self) -> HarnessResult<RollbackOutcome> {
        let Some(command) = self.rollback_command.as_deref() else {
            log::debug!("No rollback command configured; skipping rollback");
            return Ok(RollbackOutcome::NotConfigured);
        };

        let mut identifiers = self.migration_identifiers()?;
        self.order.arrange(&mut identifiers);

        let mut steps = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let command_line = rollback_command_line(command, &self.bin_dir, &identifier);
            log::info!("Rolling back {}: {}", identifier, command_line);
            let output = self.invoker.invoke(&command_line)?;
            if !output.success() {
                log::error!(
                    "Rollback command for {} exited with {:?}: {}",
                    identifier,
                    output.exit_code,
                    output.stderr.trim()
                );
            }
            steps.push(RollbackStep {
                identifier,
                command_line,
                output,
            });
        }

        booted()?.remove(&self.database_url);
        Ok(RollbackOutcome::Completed(steps))
    }
}
