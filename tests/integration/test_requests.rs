use actix_web::http::Method;
use controller_harness::http::UploadedFile;
use controller_harness::{HarnessError, RequestContext};
use serde_json::{Value, json};

use crate::common::*;

#[actix_web::test]
async fn test_verbs_reach_their_routes() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    let body: Value = client.post("/").await.unwrap().json().unwrap();
    assert_eq!(body, json!({"status": "OK_POST"}));

    let body: Value = client.put("/item/1").await.unwrap().json().unwrap();
    assert_eq!(body, json!({"status": "OK_PUT", "id": 1}));

    let body: Value = client.delete("/item/2").await.unwrap().json().unwrap();
    assert_eq!(body, json!({"status": "OK_DELETE", "id": 2}));

    let body: Value = client.patch("/item/3").await.unwrap().json().unwrap();
    assert_eq!(body, json!({"status": "OK_PATCH", "id": 3}));

    client.get("/item/4").await.unwrap();
    client.assert_status(405);
}

#[actix_web::test]
async fn test_get_parameters_go_to_query_string() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    let ctx = RequestContext::get("/echo").param("page", "2").param("q", "a b");
    let body: Value = client.call(ctx).await.unwrap().json().unwrap();
    assert_eq!(body["method"], "GET");
    assert_eq!(body["query"], "page=2&q=a+b");
    assert_eq!(body["body"], "");
}

#[actix_web::test]
async fn test_post_parameters_go_to_form_body() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    let ctx = RequestContext::post("/echo").param("name", "widget");
    let body: Value = client.call(ctx).await.unwrap().json().unwrap();
    assert_eq!(body["method"], "POST");
    assert_eq!(body["query"], "");
    assert_eq!(body["body"], "name=widget");
    assert_eq!(body["headers"]["content-type"], "application/x-www-form-urlencoded");
}

#[actix_web::test]
async fn test_server_params_become_headers_and_peer() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    let ctx = RequestContext::get("/echo")
        .header("X-Api-Key", "secret")
        .server_param("HTTP_ACCEPT", "application/json")
        .server_param("REMOTE_ADDR", "10.1.2.3");
    let body: Value = client.call(ctx).await.unwrap().json().unwrap();
    assert_eq!(body["headers"]["x-api-key"], "secret");
    assert_eq!(body["headers"]["accept"], "application/json");
    assert_eq!(body["peer"], "10.1.2.3");
}

#[actix_web::test]
async fn test_json_body() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    let ctx = RequestContext::new(Method::PUT, "/echo")
        .json(&json!({"name": "widget"}))
        .unwrap();
    let body: Value = client.call(ctx).await.unwrap().json().unwrap();
    assert_eq!(body["method"], "PUT");
    assert_eq!(body["headers"]["content-type"], "application/json");
    assert_eq!(body["body"], r#"{"name":"widget"}"#);
}

#[actix_web::test]
async fn test_files_produce_multipart_body() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    let ctx = RequestContext::post("/echo")
        .param("title", "report")
        .file(UploadedFile::new("upload", "report.txt", "file contents").with_content_type("text/plain"));
    let body: Value = client.call(ctx).await.unwrap().json().unwrap();

    let content_type = body["headers"]["content-type"].as_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let payload = body["body"].as_str().unwrap();
    assert!(payload.contains("name=\"title\""));
    assert!(payload.contains("filename=\"report.txt\""));
    assert!(payload.contains("file contents"));
}

#[actix_web::test]
async fn test_redirect_follow_up_is_get_with_server_params() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);
    client.enable_redirects(1);

    let ctx = RequestContext::post("/redirect-echo")
        .param("name", "widget")
        .header("X-Trace", "abc");
    let body: Value = client.call(ctx).await.unwrap().json().unwrap();

    assert_eq!(body["method"], "GET");
    assert_eq!(body["path"], "/echo");
    assert_eq!(body["query"], "from=redirect");
    assert_eq!(body["body"], "");
    assert_eq!(body["headers"]["x-trace"], "abc");
    assert_eq!(client.hops_followed(), 1);
}

#[actix_web::test]
async fn test_history_back_forward_and_reload() {
    let db = setup_test_db();
    let mut client = test_client!(db.pool);

    client.get("/").await.unwrap();
    client.put("/item/7").await.unwrap();
    assert_eq!(client.history().len(), 2);

    let body: Value = client.back().await.unwrap().json().unwrap();
    assert_eq!(body, json!({"status": "OK"}));

    let body: Value = client.forward().await.unwrap().json().unwrap();
    assert_eq!(body, json!({"status": "OK_PUT", "id": 7}));

    client.reload().await.unwrap();
    client.assert_status(200);
    assert_eq!(client.history().len(), 2);

    assert!(matches!(client.forward().await, Err(HarnessError::History(_))));
}

#[actix_web::test]
async fn test_exported_client_macro() {
    let mut client = controller_harness::test_client!(
        actix_web::App::new().route("/", actix_web::web::get().to(|| async { "hello" }))
    );

    let response = client.get("/").await.unwrap();
    assert_eq!(response.text(), "hello");
    client.assert_status(200);
}
