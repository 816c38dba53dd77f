use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use crate::auth::{login_redirect, AuthenticatedParticipant};
use crate::models::ParticipantError;
use crate::routes::AppState;
use crate::services::AuthServiceError;
use crate::utils::{redirect_with_flash, validators, Flash};

#[derive(Debug, Deserialize)]
pub struct CertificateRequest {
    #[serde(default)]
    pub url: String,
}

/// Scrapes the submitted activity, renders the certificate and records the
/// print in the audit table.
/// POST /generate_cert
pub async fn generate_cert(
    State(state): State<AppState>,
    session: AuthenticatedParticipant,
    Form(request): Form<CertificateRequest>,
) -> Response {
    let url = request.url.trim();
    if let Err(errors) = validators::validate_activity_url(url) {
        let message = errors.first_message().unwrap_or("Please enter a valid URL");
        return redirect_with_flash("/", Flash::danger(message));
    }

    let participant = match state.auth_service.current_participant(&session.id_card).await {
        Ok(participant) => participant,
        Err(AuthServiceError::ParticipantError(ParticipantError::ParticipantNotFound)) => {
            return login_redirect("Please log in to continue");
        }
        Err(e) => {
            tracing::error!("Failed to load participant: {}", e);
            return redirect_with_flash(
                "/",
                Flash::danger("The participant list is unavailable, please try again later"),
            );
        }
    };

    let stats = match state.scrape_service.scrape(url).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!("Failed to scrape {}: {}", url, e);
            return redirect_with_flash(
                "/",
                Flash::danger(format!("Failed to fetch activity data: {e}")),
            );
        }
    };

    let certificate = match state.certificate_service.render(&participant, &stats) {
        Ok(certificate) => certificate,
        Err(e) => {
            tracing::error!("Failed to render certificate: {}", e);
            return redirect_with_flash("/", Flash::danger("Failed to generate certificate"));
        }
    };

    let outcome = state.audit_service.record(&participant.id_card, url).await;
    tracing::info!(
        "Issued certificate {} to {} (audit: {:?})",
        certificate.serial,
        participant.display_number(),
        outcome
    );

    let disposition = format!("attachment; filename=\"{}\"", certificate.filename);
    let mut response = (StatusCode::OK, Body::from(certificate.bytes)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.append(header::SET_COOKIE, outcome.flash().set_cookie());
    response
}
