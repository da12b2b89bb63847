use std::path::PathBuf;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use uuid::Uuid;

use citywatch_api::config::{MailConfig, MailSecurity};
use citywatch_api::domain::types::MAX_FILE_BYTES;
use citywatch_api::infra::mail::SmtpMailer;
use citywatch_api::infra::storage::LocalPhotoStorage;
use citywatch_api::router::build_router;
use citywatch_api::state::{AppState, CacheTtl};

/// Router over collaborators that are never reached: every request here
/// must be answered before any data access.
fn server() -> TestServer {
    let redis = deadpool_redis::Config::from_url("redis://127.0.0.1:6390")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let mailer = SmtpMailer::new(
        &MailConfig {
            host: "localhost".into(),
            port: 2525,
            username: "noreply@citywatch.test".into(),
            password: "secret".into(),
            security: MailSecurity::StartTls,
        },
        "http://localhost:8000",
    )
    .unwrap();
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        redis,
        mailer,
        storage: LocalPhotoStorage::new(PathBuf::from("target/router-test-static")),
        cache_ttl: CacheTtl { list: 20, stats: 60 },
    };
    TestServer::new(build_router(state)).unwrap()
}

fn assert_kind(body: Value, kind: &str) {
    assert_eq!(body["kind"], kind, "unexpected body: {body}");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn should_answer_health_probe_with_request_id() {
    let response = server().get("/health").await;
    response.assert_status_ok();
    let id = response.header("x-request-id");
    assert!(id.to_str().unwrap().parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn should_require_exactly_one_login_identifier() {
    let server = server();
    let response = server
        .post("/user/login")
        .json(&json!({ "password": "secret" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_kind(response.json(), "VALIDATION");

    let response = server
        .post("/user/login")
        .json(&json!({ "email": "a@b.co", "username": "a", "password": "secret" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn should_reject_malformed_registration() {
    let server = server();
    let response = server
        .post("/user/register")
        .json(&json!({ "username": "alice", "email": "not-an-email", "password": "x" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_kind(response.json(), "VALIDATION");

    // Missing field is rejected by the JSON extractor.
    let response = server
        .post("/user/register")
        .json(&json!({ "username": "alice" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn should_reject_unknown_status_literal() {
    let response = server()
        .post("/issue/status")
        .json(&json!({ "id": Uuid::new_v4(), "token": Uuid::new_v4(), "status": "closed" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_kind(response.json(), "UNKNOWN_STATUS");
}

#[tokio::test]
async fn should_reject_unknown_status_filter() {
    let response = server().get("/issue/find?status=bogus").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_kind(response.json(), "UNKNOWN_STATUS");
}

#[tokio::test]
async fn should_reject_issue_form_without_token() {
    let form = MultipartForm::new()
        .add_text("type", "Lighting")
        .add_text("short_desc", "Lamp is out");
    let response = server().post("/issue/create").multipart(form).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_kind(response.json(), "VALIDATION");
}

#[tokio::test]
async fn should_reject_sixth_file_before_touching_storage() {
    let mut form = MultipartForm::new()
        .add_text("token", Uuid::new_v4().to_string())
        .add_text("type", "Lighting")
        .add_text("short_desc", "Lamp is out")
        .add_text("full_desc", "")
        .add_text("address", "Mira 12")
        .add_text("latitude", "56.84")
        .add_text("longitude", "60.61");
    for n in 0..6 {
        form = form.add_part(
            "files",
            Part::bytes(vec![1u8; 16]).file_name(format!("{n}.jpg")),
        );
    }
    let response = server().post("/issue/create").multipart(form).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_kind(response.json(), "TOO_MANY_FILES");
}

fn issue_form_with_photos(count: usize, size: usize) -> MultipartForm {
    let mut form = MultipartForm::new()
        .add_text("token", Uuid::new_v4().to_string())
        .add_text("type", "Lighting")
        .add_text("short_desc", "Lamp is out")
        .add_text("address", "Mira 12")
        .add_text("latitude", "56.84")
        .add_text("longitude", "60.61");
    for n in 0..count {
        form = form.add_part(
            "files",
            Part::bytes(vec![7u8; size]).file_name(format!("{n}.jpg")),
        );
    }
    form
}

#[tokio::test]
async fn should_count_six_full_size_photos_as_too_many_files() {
    let response = server()
        .post("/issue/create")
        .multipart(issue_form_with_photos(6, MAX_FILE_BYTES))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_kind(response.json(), "TOO_MANY_FILES");
}

#[tokio::test]
async fn should_report_oversized_body_as_validation_error() {
    let response = server()
        .post("/issue/create")
        .multipart(issue_form_with_photos(8, MAX_FILE_BYTES))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_kind(response.json(), "VALIDATION");
}

#[tokio::test]
async fn should_reject_out_of_range_latitude() {
    let form = MultipartForm::new()
        .add_text("token", Uuid::new_v4().to_string())
        .add_text("type", "Lighting")
        .add_text("short_desc", "Lamp is out")
        .add_text("address", "Mira 12")
        .add_text("latitude", "91")
        .add_text("longitude", "60.61");
    let response = server().post("/issue/create").multipart(form).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn should_return_404_for_missing_static_file() {
    server()
        .get("/static/photos/missing.jpg")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
