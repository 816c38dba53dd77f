use askama::Template;
use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use std::fmt;

pub const FLASH_COOKIE: &str = "flash";
const FLASH_MAX_AGE_SECONDS: i64 = 60;

/// Renders an askama template as an HTML response.
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!("Failed to render template: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to render template",
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum FlashCategory {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashCategory {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(FlashCategory::Success),
            "info" => Some(FlashCategory::Info),
            "warning" => Some(FlashCategory::Warning),
            "danger" => Some(FlashCategory::Danger),
            _ => None,
        }
    }
}

impl fmt::Display for FlashCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = match self {
            FlashCategory::Success => "success",
            FlashCategory::Info => "info",
            FlashCategory::Warning => "warning",
            FlashCategory::Danger => "danger",
        };
        write!(f, "{category}")
    }
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn new(category: FlashCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashCategory::Danger, message)
    }

    /// Encodes as `category|message`, form-url-encoded so it is a valid
    /// cookie value.
    pub fn encode(&self) -> String {
        let raw = format!("{}|{}", self.category, self.message);
        url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
    }

    pub fn decode(value: &str) -> Option<Self> {
        // A lone encoded component parses as a key with an empty value.
        let (raw, _) = url::form_urlencoded::parse(value.as_bytes()).next()?;
        let (category, message) = raw.split_once('|')?;
        Some(Self::new(FlashCategory::parse(category)?, message))
    }

    /// Reads the pending flash, if any, from the request cookies.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        cookie_value(headers, FLASH_COOKIE).and_then(|value| Self::decode(&value))
    }

    pub fn set_cookie(&self) -> HeaderValue {
        cookie_header(FLASH_COOKIE, &self.encode(), FLASH_MAX_AGE_SECONDS)
    }
}

/// Finds a cookie by name across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Builds a `Set-Cookie` value for an `HttpOnly`, `SameSite=Lax` cookie.
/// A non-positive `max_age` clears the cookie.
pub fn cookie_header(name: &str, value: &str, max_age: i64) -> HeaderValue {
    let cookie = format!(
        "{name}={value}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        max_age.max(0)
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub fn clear_cookie(name: &str) -> HeaderValue {
    cookie_header(name, "", 0)
}

/// Redirects (303) to `location` with a flash for the next page.
pub fn redirect_with_flash(location: &str, flash: Flash) -> Response {
    let mut response = Redirect::to(location).into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, flash.set_cookie());
    response
}
