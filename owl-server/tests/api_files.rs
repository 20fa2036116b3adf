//! Script and macro file endpoints.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;
use support::{error_code, TestApp};

#[tokio::test]
async fn test_upload_exists_delete() {
    let app = TestApp::new().await;

    let (status, file) = app
        .upload("/api/scripts/upload", "file", "query.sql", "select * from test")
        .await;
    assert_eq!(status, StatusCode::OK, "{file}");
    let id = file["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(file["name"], "query.sql");
    assert_eq!(file["extension"], "sql");

    let (status, body) = app.get(&format!("/api/scripts/{id}/exists")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "exists": true }));

    let (status, body) = app.get(&format!("/api/scripts/{id}/content")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "select * from test");

    let (status, _) = app.delete(&format!("/api/scripts/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&format!("/api/scripts/{id}/exists")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "exists": false }));
}

#[tokio::test]
async fn test_rename_script() {
    let app = TestApp::new().await;
    let (_, file) = app
        .post("/api/scripts", json!({ "name": "original.sql", "content": "select 1" }))
        .await;
    let id = file["id"].as_i64().unwrap();

    let (status, renamed) = app
        .put(&format!("/api/scripts/{id}/rename"), json!({ "name": "renamed.sql" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["path"], file["path"]);

    let (_, fetched) = app.get(&format!("/api/scripts/{id}")).await;
    assert_eq!(fetched["name"], "renamed.sql");

    let (_, content) = app.get(&format!("/api/scripts/{id}/content")).await;
    assert_eq!(content["content"], "select 1");
}

#[tokio::test]
async fn test_create_requires_sql_suffix() {
    let app = TestApp::new().await;
    for name in ["notes.txt", "a.sq", "x.sql.bak"] {
        let (status, body) = app.post("/api/macrofiles", json!({ "name": name })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{name}");
        assert_eq!(error_code(&body), "VALIDATION_ERROR");
        assert!(body["error"]["details"]["name"].is_array());
    }

    let (status, _) = app
        .upload("/api/macrofiles/upload", "file", "macro.txt", "select 1")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = app.get("/api/macrofiles").await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_update_requires_a_field() {
    let app = TestApp::new().await;
    let (_, file) = app.post("/api/scripts", json!({ "name": "query.sql" })).await;
    let id = file["id"].as_i64().unwrap();

    let (status, body) = app.put(&format!("/api/scripts/{id}"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["__all__"].is_array());

    let (status, updated) = app
        .put(
            &format!("/api/scripts/{id}"),
            json!({ "name": "daily.sql", "content": "select 42" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "daily.sql");

    let (_, content) = app.get(&format!("/api/scripts/{id}/content")).await;
    assert_eq!(content["content"], "select 42");
}

#[tokio::test]
async fn test_save_content() {
    let app = TestApp::new().await;
    let (_, file) = app.post("/api/macrofiles", json!({ "name": "macro.sql" })).await;
    let id = file["id"].as_i64().unwrap();

    let (_, content) = app.get(&format!("/api/macrofiles/{id}/content")).await;
    assert_eq!(content["content"], "");

    let (status, _) = app
        .put(
            &format!("/api/macrofiles/{id}/content"),
            json!({ "content": "{% macro m() %}select 1{% endmacro %}" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, content) = app.get(&format!("/api/macrofiles/{id}/content")).await;
    assert_eq!(content["content"], "{% macro m() %}select 1{% endmacro %}");
}

#[tokio::test]
async fn test_kinds_are_separate() {
    let app = TestApp::new().await;
    let (_, script) = app.post("/api/scripts", json!({ "name": "script.sql" })).await;
    assert!(script["path"].as_str().unwrap().starts_with("scripts/"));

    let (_, list) = app.get("/api/macrofiles").await;
    assert_eq!(list, json!([]));

    let id = script["id"].as_i64().unwrap();
    let (status, body) = app.get(&format!("/api/macrofiles/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_file_and_bad_id() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/scripts/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .put("/api/scripts/999/rename", json!({ "name": "renamed.sql" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/scripts/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let app = TestApp::new().await;
    let (status, body) = app
        .upload("/api/scripts/upload", "attachment", "query.sql", "select 1")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["file"].is_array());
}

#[tokio::test]
async fn test_requires_identity() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/scripts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "UNAUTHORIZED");
}
