use serde::Serialize;
use std::sync::Arc;

use crate::auth::{SessionError, SessionService};
use crate::models::participant::{LoginRequest, Participant, ParticipantError};
use crate::store::{StoreError, UserTable};

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(rename = "session-token")]
    pub session_token: String,
    pub expires_in: i64,
    pub participant: Participant,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Participant error: {0}")]
    ParticipantError(#[from] ParticipantError),
    #[error("Session error: {0}")]
    SessionError(#[from] SessionError),
    #[error("User table error: {0}")]
    StoreError(#[from] StoreError),
}

pub struct AuthService {
    session_service: Arc<SessionService>,
    directory: Arc<dyn UserTable>,
}

impl AuthService {
    pub fn new(session_service: Arc<SessionService>, directory: Arc<dyn UserTable>) -> Self {
        Self {
            session_service,
            directory,
        }
    }

    /// Checks the ID number and phone against the user table and opens a
    /// session. Unknown IDs and wrong phones are indistinguishable to the
    /// caller.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthServiceError> {
        let id_card = request.username.trim();
        let phone = request.password.trim();
        if id_card.is_empty() || phone.is_empty() {
            return Err(ParticipantError::InvalidCredentials.into());
        }

        let participant = self
            .directory
            .find_participant(id_card)
            .await?
            .ok_or(ParticipantError::InvalidCredentials)?;
        participant.verify_phone(phone)?;

        let session_token = self.session_service.create_token(&participant.id_card)?;

        Ok(LoginResponse {
            session_token,
            expires_in: self.session_service.ttl_seconds(),
            participant,
        })
    }

    pub async fn current_participant(&self, id_card: &str) -> Result<Participant, AuthServiceError> {
        let participant = self
            .directory
            .find_participant(id_card)
            .await?
            .ok_or(ParticipantError::ParticipantNotFound)?;
        Ok(participant)
    }
}
