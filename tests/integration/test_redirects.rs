use controller_harness::HarnessError;
use serde_json::json;

use crate::common::*;

#[actix_web::test]
async fn test_redirect_not_followed_by_default() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    let response = client.get("/redirect").await.unwrap();
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.location(), Some("/"));
    assert_eq!(client.hops_followed(), 0);
    client.assert_status(302).assert_header("Location", Some("/"));
}

#[actix_web::test]
async fn test_single_redirect_followed() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);
    client.enable_redirects(2);

    let response = client.get("/redirect").await.unwrap();
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<serde_json::Value>().unwrap(), json!({"status": "OK"}));
    assert_eq!(client.hops_followed(), 1);
}

#[actix_web::test]
async fn test_redirect_chain_within_cap() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);
    client.enable_redirects(2);

    client.get("/redirect-redirect").await.unwrap();
    client.assert_status(200);
    assert_eq!(client.hops_followed(), 2);
}

#[actix_web::test]
async fn test_redirect_chain_longer_than_cap_raises() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);
    client.enable_redirects(1);

    let err = client.get("/redirect-redirect").await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::MaxRedirectExceeded { hops: 1, ref uri } if uri == "/redirect"
    ));
    assert_eq!(client.hops_followed(), 1);
}

#[actix_web::test]
async fn test_circular_redirect_raises_after_cap() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);
    client.enable_redirects(2);

    let err = client.get("/circle-redirect").await.unwrap_err();
    match err {
        HarnessError::MaxRedirectExceeded { hops, uri } => {
            assert_eq!(hops, 2);
            assert_eq!(uri, "/circle-redirect");
        }
        other => panic!("expected MaxRedirectExceeded, got {other:?}"),
    }
    assert_eq!(client.hops_followed(), 2);
    client.assert_status(302);
}

#[actix_web::test]
async fn test_circular_redirect_without_raise_returns_redirect() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);
    client.enable_redirects(2).set_raise_on_exceed(false);

    let response = client.get("/circle-redirect").await.unwrap();
    assert_eq!(response.status_code(), 302);
    assert_eq!(client.hops_followed(), 2);
}

#[actix_web::test]
async fn test_each_verb_call_starts_from_zero_hops() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);
    client.enable_redirects(2);

    client.get("/redirect-redirect").await.unwrap();
    assert_eq!(client.hops_followed(), 2);
    client.get("/redirect").await.unwrap();
    assert_eq!(client.hops_followed(), 1);
    client.get("/").await.unwrap();
    assert_eq!(client.hops_followed(), 0);
}

#[actix_web::test]
async fn test_unknown_route_is_not_found() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);
    client.enable_redirects(2);

    client.get("/does-not-exist").await.unwrap();
    client.assert_status(404);
    assert_eq!(client.hops_followed(), 0);
}
