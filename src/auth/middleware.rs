use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::session::{SessionError, SessionService, SESSION_COOKIE};
use crate::utils::responses::{clear_cookie, cookie_value, redirect_with_flash, Flash};

#[derive(Clone)]
pub struct SessionState {
    pub session_service: Arc<SessionService>,
}

/// The logged-in participant, identified by ID number.
#[derive(Debug, Clone)]
pub struct AuthenticatedParticipant {
    pub id_card: String,
}

/// Sends the browser back to the login page.
pub fn login_redirect(message: &str) -> Response {
    let mut response = redirect_with_flash("/login", Flash::warning(message));
    response
        .headers_mut()
        .append(header::SET_COOKIE, clear_cookie(SESSION_COOKIE));
    response
}

// Extractor for logged-in participants. Accepts the session cookie or a
// bearer token.
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedParticipant
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(header::AUTHORIZATION) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| login_redirect("Please log in to continue"))?;
                SessionService::extract_token_from_header(value)
                    .map_err(|_| login_redirect("Please log in to continue"))?
                    .to_string()
            }
            None => cookie_value(&parts.headers, SESSION_COOKIE)
                .filter(|token| !token.is_empty())
                .ok_or_else(|| login_redirect("Please log in to continue"))?,
        };

        // Get session service from extensions (set by middleware)
        let session_service = parts
            .extensions
            .get::<Arc<SessionService>>()
            .ok_or_else(|| {
                tracing::error!("Session service missing from request extensions");
                login_redirect("Please log in to continue")
            })?;

        let claims = session_service.validate_token(&token).map_err(|e| {
            tracing::debug!("Rejected session: {}", e);
            match e {
                SessionError::TokenExpired => {
                    login_redirect("Your session has expired, please log in again")
                }
                _ => login_redirect("Please log in to continue"),
            }
        })?;

        Ok(AuthenticatedParticipant {
            id_card: claims.upn,
        })
    }
}

// Middleware to inject the session service into request extensions
pub async fn session_middleware(
    State(session_state): State<SessionState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request
        .extensions_mut()
        .insert(session_state.session_service.clone());

    next.run(request).await
}
