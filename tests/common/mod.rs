#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use sanctuary::{
    api::create_app,
    auth::{Claims, TokenVerifier},
    config::Settings,
    service::ServiceContext,
    storage::LocalBlobStore,
};
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret";
const BOUNDARY: &str = "sanctuary-test-boundary";

/// A fresh in-memory database behind the full router.
pub struct TestApp {
    pub router: Router,
    pub context: Arc<ServiceContext>,
    pub pool: SqlitePool,
    pub uploads: TempDir,
}

/// One connection so every query sees the same in-memory database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

pub async fn spawn_app() -> anyhow::Result<TestApp> {
    let pool = test_pool().await?;
    let uploads = tempfile::tempdir()?;

    let mut settings = Settings::default();
    settings.server.uploads_dir = uploads.path().to_string_lossy().into_owned();
    settings.server.base_url = "http://church.test".to_string();
    settings.auth.jwt_secret = TEST_SECRET.to_string();

    let blob_store = Arc::new(LocalBlobStore::new(uploads.path()));
    let context = Arc::new(ServiceContext::new(pool.clone(), blob_store));
    let verifier = Arc::new(TokenVerifier::new(TEST_SECRET, settings.auth.admin_roles.clone()));
    let router = create_app(context.clone(), Arc::new(settings), verifier);

    Ok(TestApp {
        router,
        context,
        pool,
        uploads,
    })
}

pub fn token(sub: &str, email: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        email: Some(email.to_string()),
        role: Some(role.to_string()),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes()))
        .expect("token encodes")
}

pub fn member_token(email: &str) -> String {
    token(&format!("user-{}", email), email, "member")
}

pub fn admin_token() -> String {
    token("admin-1", "pastor@church.test", "admin")
}

pub fn json_request(method: Method, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub struct FilePart<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

pub fn multipart_request(
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    fields: &[(&str, &str)],
    files: &[FilePart<'_>],
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).expect("request builds")
}

pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Number of files stored under `<uploads>/<dir>`.
pub fn stored_files(uploads: &Path, dir: &str) -> usize {
    std::fs::read_dir(uploads.join(dir))
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0)
}

pub fn long_text(words: usize) -> String {
    vec!["grace"; words].join(" ")
}
