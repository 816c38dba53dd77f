mod common;

use axum::{
    body::to_bytes,
    http::StatusCode,
};
use serde_json::Value;
use std::path::PathBuf;
use tower::ServiceExt;

use common::{flash, form_request, get_request, location, login, set_cookie, setup_app, test_config, users_csv};
use finisher_cert_server::{store::TableSource, utils::FlashCategory};

const API_BASE: &str = "http://127.0.0.1:9";

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_login_page_renders_form() {
    let users = users_csv();
    let app = setup_app(&test_config(TableSource::Csv(users.path().to_path_buf()), API_BASE));

    let response = app.oneshot(get_request("/login", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("action=\"/login\""));
    assert!(html.contains("name=\"username\""));
}

#[tokio::test]
async fn test_login_success_sets_session() {
    let users = users_csv();
    let app = setup_app(&test_config(TableSource::Csv(users.path().to_path_buf()), API_BASE));

    // The table stores the phone as a number without its leading zero.
    let response = app
        .oneshot(form_request(
            "/login",
            "username=A123456789&password=0912345678",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));
    assert!(set_cookie(&response, "session").is_some_and(|token| !token.is_empty()));

    let flash = flash(&response).unwrap();
    assert_eq!(flash.category, FlashCategory::Success);
    assert_eq!(flash.message, "Welcome, Lin Mei");
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let users = users_csv();
    let app = setup_app(&test_config(TableSource::Csv(users.path().to_path_buf()), API_BASE));

    for body in [
        "username=A123456789&password=0900000000",
        "username=Z000000000&password=0912345678",
    ] {
        let response = app.clone().oneshot(form_request("/login", body, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response).as_deref(), Some("/login"));
        assert!(set_cookie(&response, "session").is_none());
        assert_eq!(
            flash(&response).unwrap().message,
            "Invalid ID number or phone number"
        );
    }
}

#[tokio::test]
async fn test_login_missing_fields() {
    let users = users_csv();
    let app = setup_app(&test_config(TableSource::Csv(users.path().to_path_buf()), API_BASE));

    let response = app
        .oneshot(form_request("/login", "password=0912345678", None))
        .await
        .unwrap();

    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert_eq!(
        flash(&response).unwrap().message,
        "Please enter your ID number"
    );
}

#[tokio::test]
async fn test_index_requires_session() {
    let users = users_csv();
    let app = setup_app(&test_config(TableSource::Csv(users.path().to_path_buf()), API_BASE));

    let response = app.oneshot(get_request("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
    let flash = flash(&response).unwrap();
    assert_eq!(flash.category, FlashCategory::Warning);
    assert_eq!(flash.message, "Please log in to continue");
}

#[tokio::test]
async fn test_index_rejects_forged_session() {
    let users = users_csv();
    let app = setup_app(&test_config(TableSource::Csv(users.path().to_path_buf()), API_BASE));

    let response = app
        .oneshot(get_request("/", Some("session=eyJhbGciOiJIUzI1NiJ9.e30.c2ln")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_index_shows_participant_and_consumes_flash() {
    let users = users_csv();
    let app = setup_app(&test_config(TableSource::Csv(users.path().to_path_buf()), API_BASE));
    let session = login(&app, "B987654321", "0922000111").await;

    let cookie = format!("{session}; flash=success%7CHello");
    let response = app.oneshot(get_request("/", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie(&response, "flash").as_deref(), Some(""));
    let html = body_text(response).await;
    assert!(html.contains("Chen Wei"));
    assert!(html.contains("A002"));
    assert!(html.contains("Hello"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let users = users_csv();
    let app = setup_app(&test_config(TableSource::Csv(users.path().to_path_buf()), API_BASE));

    let response = app.oneshot(get_request("/logout", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert_eq!(set_cookie(&response, "session").as_deref(), Some(""));
    let flash = flash(&response).unwrap();
    assert_eq!(flash.category, FlashCategory::Info);
    assert_eq!(flash.message, "You have been logged out");
}

#[tokio::test]
async fn test_health_reports_tables() {
    let users = users_csv();
    let app = setup_app(&test_config(TableSource::Csv(users.path().to_path_buf()), API_BASE));

    let response = app.oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["user_table"], "healthy");
    assert_eq!(body["audit_table"], "connected");
}

#[tokio::test]
async fn test_health_unavailable_without_user_table() {
    let app = setup_app(&test_config(
        TableSource::Csv(PathBuf::from("/nonexistent/users.csv")),
        API_BASE,
    ));

    let response = app.oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "unhealthy");
}

fn users_xlsx(sheet: Option<&str>) -> TableSource {
    TableSource::Xlsx {
        path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/users.xlsx"),
        sheet: sheet.map(str::to_string),
    }
}

#[tokio::test]
async fn test_login_against_workbook() {
    let app = setup_app(&test_config(users_xlsx(None), API_BASE));

    // The workbook stores this phone as the number 912345678.
    let session = login(&app, "A123456789", "0912345678").await;
    let response = app
        .clone()
        .oneshot(get_request("/", Some(&session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Lin Mei"));
    assert!(html.contains("A001"));

    // A read-only workbook leaves no audit table.
    let response = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["user_table"], "healthy");
    assert_eq!(body["audit_table"], "disconnected");
}

#[tokio::test]
async fn test_login_against_named_workbook_sheet() {
    let app = setup_app(&test_config(users_xlsx(Some("roster")), API_BASE));

    let response = app
        .clone()
        .oneshot(form_request(
            "/login",
            "username=C000000000&password=0933000000",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(location(&response).as_deref(), Some("/"));
    assert_eq!(flash(&response).unwrap().message, "Welcome, Wang Fang");

    let response = app
        .oneshot(form_request(
            "/login",
            "username=A123456789&password=0912345678",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_missing_workbook_sheet_is_unhealthy() {
    let app = setup_app(&test_config(users_xlsx(Some("archive")), API_BASE));

    let response = app.oneshot(get_request("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["user_table"], "unhealthy");
}
