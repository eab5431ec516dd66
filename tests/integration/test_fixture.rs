use controller_harness::{
    ActixDispatcher, ControllerFixture, HarnessConfig, HarnessError, RequestContext, json_shape,
};

use crate::common::*;

fn config_for(db: &TestDb) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.database_url = Some(db.url.clone());
    config.redirect.max_hops = Some(2);
    config
}

#[actix_web::test]
async fn test_fixture_request_then_database_checks() {
    let db = setup_test_db();
    let app = test_service!(db.pool);
    let mut fixture = ControllerFixture::from_config(ActixDispatcher::new(app), &config_for(&db)).unwrap();

    fixture
        .post("/create-user/frank/f")
        .await
        .unwrap()
        .assert_status(201)
        .assert_json_structure(&json_shape!["status" => "CREATED"])
        .assert_row_exists("users", [("username", "frank")])
        .assert_row_count("users", 1, [("password", "f")]);
}

#[actix_web::test]
async fn test_fixture_follows_redirects_from_config() {
    let db = setup_test_db();
    let app = test_service!(db.pool);
    let mut fixture = ControllerFixture::from_config(ActixDispatcher::new(app), &config_for(&db)).unwrap();

    fixture
        .get("/redirect")
        .await
        .unwrap()
        .assert_status(200)
        .assert_json_structure(&json_shape!["status" => "OK"]);
    assert_eq!(fixture.hops_followed(), 1);

    let err = fixture
        .call(RequestContext::get("/circle-redirect"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, HarnessError::MaxRedirectExceeded { hops: 2, .. }));
    fixture.assert_status(302);
}

#[actix_web::test]
async fn test_fixture_with_explicit_pool() {
    let db = setup_test_db();
    let client = test_client!(db.pool);
    let mut fixture = ControllerFixture::new(client).with_pool(db.pool.clone());

    fixture.client_mut().enable_redirects(1);
    fixture
        .get("/redirect-redirect")
        .await
        .err()
        .unwrap();
    assert_eq!(fixture.hops_followed(), 1);
    fixture.assert_row_count("users", 0, [("username", "nobody")]);
}
