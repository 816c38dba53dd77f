use askama::Template;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::auth::{login_redirect, AuthenticatedParticipant, SESSION_COOKIE};
use crate::models::{LoginRequest, ParticipantError};
use crate::routes::AppState;
use crate::services::AuthServiceError;
use crate::utils::responses::{clear_cookie, cookie_header, FLASH_COOKIE};
use crate::utils::{redirect_with_flash, validators, Flash, FlashCategory, HtmlTemplate};

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub flash: Option<Flash>,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub flash: Option<Flash>,
    pub name: String,
    pub user_number: String,
    pub last_print: Option<String>,
    pub uploaded_url: Option<String>,
}

/// Renders a page, consuming the pending flash cookie if one was shown.
fn page<T: Template>(template: T, flash_shown: bool) -> Response {
    let mut response = HtmlTemplate(template).into_response();
    if flash_shown {
        response
            .headers_mut()
            .append(header::SET_COOKIE, clear_cookie(FLASH_COOKIE));
    }
    response
}

/// GET /login
pub async fn login_page(headers: HeaderMap) -> Response {
    let flash = Flash::from_headers(&headers);
    let flash_shown = flash.is_some();
    page(LoginTemplate { flash }, flash_shown)
}

/// POST /login
pub async fn login_submit(
    State(state): State<AppState>,
    Form(request): Form<LoginRequest>,
) -> Response {
    if let Err(errors) = validators::validate_login(&request.username, &request.password) {
        let message = errors
            .first_message()
            .unwrap_or("Please enter your ID number and phone number");
        return redirect_with_flash("/login", Flash::danger(message));
    }

    match state.auth_service.login(&request).await {
        Ok(response) => {
            tracing::info!(
                "Participant {} logged in",
                response.participant.display_number()
            );
            let mut redirect = redirect_with_flash(
                "/",
                Flash::success(format!("Welcome, {}", response.participant.display_name())),
            );
            redirect.headers_mut().append(
                header::SET_COOKIE,
                cookie_header(SESSION_COOKIE, &response.session_token, response.expires_in),
            );
            redirect
        }
        Err(AuthServiceError::ParticipantError(e)) => {
            tracing::warn!("Login rejected: {}", e);
            redirect_with_flash("/login", Flash::danger("Invalid ID number or phone number"))
        }
        Err(e) => {
            tracing::error!("Login failed with error: {}", e);
            redirect_with_flash(
                "/login",
                Flash::danger("The participant list is unavailable, please try again later"),
            )
        }
    }
}

/// GET /logout
pub async fn logout() -> Response {
    let mut response = Redirect::to("/login").into_response();
    let headers = response.headers_mut();
    headers.append(header::SET_COOKIE, clear_cookie(SESSION_COOKIE));
    headers.append(
        header::SET_COOKIE,
        Flash::new(FlashCategory::Info, "You have been logged out").set_cookie(),
    );
    response
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    session: AuthenticatedParticipant,
    headers: HeaderMap,
) -> Response {
    let participant = match state.auth_service.current_participant(&session.id_card).await {
        Ok(participant) => participant,
        Err(AuthServiceError::ParticipantError(ParticipantError::ParticipantNotFound)) => {
            tracing::warn!("Session refers to a participant no longer in the table");
            return login_redirect("Please log in to continue");
        }
        Err(e) => {
            tracing::error!("Failed to load participant: {}", e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "The participant list is unavailable, please try again later",
            )
                .into_response();
        }
    };

    let flash = Flash::from_headers(&headers);
    let flash_shown = flash.is_some();
    page(
        IndexTemplate {
            flash,
            name: participant.display_name().to_string(),
            user_number: participant.display_number().to_string(),
            last_print: participant.last_print,
            uploaded_url: participant.uploaded_url,
        },
        flash_shown,
    )
}
