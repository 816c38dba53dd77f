pub mod web;

use chrono::FixedOffset;
use std::sync::Arc;

use crate::auth::{SessionService, SessionState};
use crate::config::Config;
use crate::services::{
    AuditService, AuthService, CertificateError, CertificateService, ScrapeService,
    ScrapeSettings,
};
use crate::store::{open_table, StoreError, UserTable};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub scrape_service: Arc<ScrapeService>,
    pub certificate_service: Arc<CertificateService>,
    pub audit_service: Arc<AuditService>,
    pub directory: Arc<dyn UserTable>,
    pub session_state: SessionState,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to open user table: {0}")]
    UserTable(#[from] StoreError),
    #[error("Failed to load certificate font: {0}")]
    Certificate(#[from] CertificateError),
    #[error("Invalid audit UTC offset: {0} minutes")]
    InvalidOffset(i32),
}

impl AppState {
    /// Wires the services together from configuration. An audit table that
    /// cannot be opened only disables audit records.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let directory = open_table(&config.user_table, config)?;

        let audit_table = match &config.audit_table {
            Some(source) => match open_table(source, config) {
                Ok(table) => Some(table),
                Err(e) => {
                    tracing::warn!("Audit table {} unavailable: {}", source, e);
                    None
                }
            },
            None if directory.is_writable() => Some(directory.clone()),
            None => {
                tracing::warn!(
                    "User table {} is read-only and no AUDIT_TABLE is set, prints will not be recorded",
                    directory.describe()
                );
                None
            }
        };

        let offset = FixedOffset::east_opt(config.audit_utc_offset_minutes * 60)
            .ok_or(StartupError::InvalidOffset(config.audit_utc_offset_minutes))?;

        let session_service = Arc::new(SessionService::new(
            &config.session_secret,
            config.session_ttl_minutes,
        ));
        let auth_service = Arc::new(AuthService::new(session_service.clone(), directory.clone()));
        let scrape_service = Arc::new(ScrapeService::new(ScrapeSettings {
            allowed_hosts: config.allowed_activity_hosts.clone(),
            strava_access_token: config.strava_access_token.clone(),
            strava_api_base: config.strava_api_base.clone(),
            garmin_api_base: config.garmin_api_base.clone(),
        }));
        let certificate_service = Arc::new(CertificateService::new(
            config.cert_font_path.as_deref(),
        )?);
        let audit_service = Arc::new(AuditService::new(audit_table, offset));

        tracing::info!(
            "Services initialized (users: {}, audit: {})",
            directory.describe(),
            audit_service
                .describe()
                .unwrap_or_else(|| "disconnected".to_string())
        );

        Ok(AppState {
            auth_service,
            scrape_service,
            certificate_service,
            audit_service,
            directory,
            session_state: SessionState { session_service },
        })
    }
}

pub use web::create_router;
