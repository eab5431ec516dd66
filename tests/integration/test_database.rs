use controller_harness::assertions::{assert_row_count, assert_row_exists};
use controller_harness::{Condition, RequestContext};
use serde_json::{Value, json};

use crate::common::*;

#[actix_web::test]
async fn test_created_user_is_visible() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    client.post("/create-user/alice/secret").await.unwrap();
    client.assert_status(201);

    let mut conn = db.pool.get().unwrap();
    assert_row_count(&mut conn, "users", 1, Condition::none());
    assert_row_exists(&mut conn, "users", [("username", "alice"), ("password", "secret")]);
    assert_row_count(&mut conn, "users", 0, [("username", "bob")]);
}

#[actix_web::test]
async fn test_empty_filter_matches_empty_string_and_null() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    // username = ''
    client
        .call(RequestContext::post("/create-user").param("username", "").param("password", "a"))
        .await
        .unwrap();
    // username IS NULL
    client
        .call(RequestContext::post("/create-user").param("password", "b"))
        .await
        .unwrap();
    client.post("/create-user/carol/c").await.unwrap();

    let mut conn = db.pool.get().unwrap();
    assert_row_count(&mut conn, "users", 2, [("username", "")]);
    assert_row_count(&mut conn, "users", 2, [("username", Value::Null)]);
    assert_row_count(
        &mut conn,
        "users",
        1,
        Condition::try_from(json!({"username": "", "password": "b"})).unwrap(),
    );
    assert_row_count(&mut conn, "users", 3, Condition::none());
}

#[actix_web::test]
async fn test_raw_condition() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    client.post("/create-user/dave/d").await.unwrap();
    client.post("/create-user/erin/e").await.unwrap();

    let mut conn = db.pool.get().unwrap();
    assert_row_exists(&mut conn, "users", "username LIKE 'da%'");
    assert_row_count(&mut conn, "users", 2, "password IN ('d', 'e')");
}

#[test]
#[should_panic(expected = "no rows in users")]
fn test_row_exists_fails_on_empty_table() {
    let db = setup_test_db();
    let mut conn = db.pool.get().unwrap();
    assert_row_exists(&mut conn, "users", Condition::none());
}
