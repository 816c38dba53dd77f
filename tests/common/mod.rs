#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use finisher_cert_server::{
    create_router, store::TableSource, utils::Flash, AppState, Config,
};

pub const SECRET: &str = "test-secret-key-that-is-long-enough-for-testing-32chars";
pub const USERS_CSV: &str = "id_card,phone,name,user_number\n\
A123456789,912345678,Lin Mei,A001\n\
B987654321,0922000111,Chen Wei,A002\n";

/// A CSV user table with two participants.
pub fn users_csv() -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(USERS_CSV.as_bytes())
        .expect("Failed to write users");
    file
}

/// Configuration pointing every external service at `api_base`.
pub fn test_config(user_table: TableSource, api_base: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        session_secret: SECRET.to_string(),
        session_ttl_minutes: 120,
        user_table,
        audit_table: None,
        google_credentials: PathBuf::from("tests/fixtures/service_account.json"),
        sheets_api_base: api_base.to_string(),
        cert_font_path: None,
        audit_utc_offset_minutes: 480,
        allowed_activity_hosts: vec![
            "www.strava.com".to_string(),
            "connect.garmin.com".to_string(),
            "127.0.0.1".to_string(),
        ],
        strava_access_token: None,
        strava_api_base: format!("{api_base}/api/v3"),
        garmin_api_base: api_base.to_string(),
    }
}

pub fn setup_app(config: &Config) -> Router {
    let state = AppState::from_config(config).expect("Failed to build app state");
    create_router(state)
}

pub fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` pairs from every `Set-Cookie` header.
pub fn set_cookies<B>(response: &Response<B>) -> Vec<(String, String)> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

pub fn set_cookie<B>(response: &Response<B>, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|(cookie, _)| cookie == name)
        .map(|(_, value)| value)
}

pub fn flash<B>(response: &Response<B>) -> Option<Flash> {
    set_cookie(response, "flash").and_then(|value| Flash::decode(&value))
}

pub fn location<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Logs in and returns the `Cookie` header value for the session.
pub async fn login(app: &Router, id_card: &str, phone: &str) -> String {
    let response = app
        .clone()
        .oneshot(form_request(
            "/login",
            &format!("username={id_card}&password={phone}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let token = set_cookie(&response, "session").expect("No session cookie set");
    format!("session={token}")
}
