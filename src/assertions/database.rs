use diesel::SqliteConnection;

use crate::db::{self, Condition};

fn count_or_panic(conn: &mut SqliteConnection, table: &str, condition: &Condition) -> i64 {
    match db::count_rows(conn, table, condition) {
        Ok(count) => count,
        Err(e) => panic!("Failed to count rows in {}: {}", table, e),
    }
}

/// Assert the number of rows in `table` matching `condition`.
pub fn assert_row_count(
    conn: &mut SqliteConnection,
    table: &str,
    expected: i64,
    condition: impl Into<Condition>,
) {
    let condition = condition.into();
    let actual = count_or_panic(conn, table, &condition);
    assert_eq!(
        expected, actual,
        "unexpected row count in {} for {:?}",
        table, condition
    );
}

/// Assert at least one row in `table` matches `condition`.
pub fn assert_row_exists(conn: &mut SqliteConnection, table: &str, condition: impl Into<Condition>) {
    let condition = condition.into();
    let actual = count_or_panic(conn, table, &condition);
    assert!(
        actual > 0,
        "no rows in {} match {:?}",
        table, condition
    );
}
