//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use common::config::AppConfig;
use owl_server::{create_router, AppState, SERVICE_NAME};

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;

const BOUNDARY: &str = "owl-test-boundary";

/// Router backed by a fresh data directory.
pub struct TestApp {
    router: Router,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::for_data_dir(SERVICE_NAME, dir.path());
        tweak(&mut config);
        let state = AppState::new(config).await.unwrap();
        Self {
            router: create_router(state),
            dir,
        }
    }

    /// Sends a request as `user` (anonymous for `None`) with an optional JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user {
            builder = builder
                .header("x-user-id", id.to_string())
                .header("x-user-name", format!("user{id}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.dispatch(builder.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(ALICE), None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(ALICE), Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(ALICE), Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(ALICE), None).await
    }

    /// Uploads `content` as multipart field `field` with the given file name.
    pub async fn upload(&self, uri: &str, field: &str, file_name: &str, content: &str) -> (StatusCode, Value) {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/sql\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-user-id", ALICE.to_string())
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }
}

/// Error code of an error response body.
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
