//! SQLite access for row assertions and migration boot.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::Sqlite;
use serde_json::Value;

use crate::error::{HarnessError, HarnessResult};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub fn initialize_db_pool(database_url: &str, max_size: u32) -> HarnessResult<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder().max_size(max_size).build(manager)?;
    log::debug!("Opened SQLite pool for {} (max {})", database_url, max_size);
    Ok(pool)
}

/// Row filter for [`count_rows`]: an optional raw SQL clause plus
/// `col = value` pairs, all joined with `AND`.
///
/// Null and empty-string column values match `''` or `NULL`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    raw: Option<String>,
    columns: Vec<(String, Value)>,
}

impl Condition {
    pub fn none() -> Self {
        Self::default()
    }

    /// Raw SQL placed after `WHERE` as is.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            raw: Some(sql.into()),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push((name.into(), value.into()));
        self
    }

    pub fn raw_sql(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }
}

impl From<&str> for Condition {
    fn from(raw: &str) -> Self {
        Condition::raw(raw)
    }
}

impl From<String> for Condition {
    fn from(raw: String) -> Self {
        Condition::raw(raw)
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Condition {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .fold(Condition::none(), |condition, (k, v)| condition.column(k, v))
    }
}

impl From<Vec<(String, Value)>> for Condition {
    fn from(columns: Vec<(String, Value)>) -> Self {
        Self { raw: None, columns }
    }
}

/// Objects become column filters, strings become raw conditions and null
/// means no filter. Anything else is rejected.
impl TryFrom<Value> for Condition {
    type Error = HarnessError;

    fn try_from(value: Value) -> HarnessResult<Self> {
        match value {
            Value::Object(map) => Ok(Condition::from(map.into_iter().collect::<Vec<_>>())),
            Value::String(raw) => Ok(Condition::raw(raw)),
            Value::Null => Ok(Condition::none()),
            other => Err(HarnessError::InvalidCondition(format!(
                "expected an object, a string or null, got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    cnt: i64,
}

/// Double-quote a table or column name, allowing `schema.name`.
pub fn quote_identifier(name: &str) -> HarnessResult<String> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| valid_part(p)) {
        return Err(HarnessError::InvalidIdentifier(name.to_string()));
    }
    Ok(parts
        .iter()
        .map(|p| format!("\"{}\"", p))
        .collect::<Vec<_>>()
        .join("."))
}

fn is_empty_filter(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn bind_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => u8::from(*b).to_string(),
        other => other.to_string(),
    }
}

/// Build the count statement and the values to bind, in placeholder order.
pub fn build_count_query(table: &str, condition: &Condition) -> HarnessResult<(String, Vec<String>)> {
    let mut sql = format!("SELECT count(*) AS cnt FROM {}", quote_identifier(table)?);
    let mut binds = Vec::new();

    let mut clauses = Vec::with_capacity(condition.columns.len() + 1);
    if let Some(raw) = condition.raw.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        if condition.columns.is_empty() {
            clauses.push(raw.to_string());
        } else {
            clauses.push(format!("({})", raw));
        }
    }
    for (column, value) in &condition.columns {
        let column = quote_identifier(column)?;
        if is_empty_filter(value) {
            clauses.push(format!("({0} = '' OR {0} IS NULL)", column));
        } else {
            clauses.push(format!("{} = ?", column));
            binds.push(bind_text(value));
        }
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    Ok((sql, binds))
}

pub fn count_rows(
    conn: &mut SqliteConnection,
    table: &str,
    condition: &Condition,
) -> HarnessResult<i64> {
    let (sql, binds) = build_count_query(table, condition)?;
    log::debug!("Counting rows: {} {:?}", sql, binds);

    let mut query = diesel::sql_query(sql).into_boxed::<Sqlite>();
    for value in binds {
        query = query.bind::<Text, _>(value);
    }
    let row = query.get_result::<CountRow>(conn)?;
    Ok(row.cnt)
}
