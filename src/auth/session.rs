use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "session";
const ISSUER: &str = "finisher-cert";

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    /// The participant's ID number.
    pub upn: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session token creation failed: {0}")]
    TokenCreationFailed(#[from] jsonwebtoken::errors::Error),
    #[error("Session token validation failed: {0}")]
    TokenValidationFailed(String),
    #[error("Session expired")]
    TokenExpired,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
}

pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn create_token(&self, id_card: &str) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            iss: ISSUER.to_string(),
            upn: id_card.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(SessionError::from)
    }

    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);

        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => {
                if token_data.claims.exp < Utc::now().timestamp() {
                    return Err(SessionError::TokenExpired);
                }
                Ok(token_data.claims)
            }
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(SessionError::TokenExpired),
                _ => Err(SessionError::TokenValidationFailed(e.to_string())),
            },
        }
    }

    pub fn extract_token_from_header(auth_header: &str) -> Result<&str, SessionError> {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            Ok(token)
        } else {
            Err(SessionError::InvalidAuthHeaderFormat)
        }
    }
}
