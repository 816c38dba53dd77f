use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::store::TableSource;

const DEFAULT_FONT_PATH: &str = "NotoSansTC-Regular.ttf";
const DEFAULT_ALLOWED_HOSTS: &str = "www.strava.com,strava.com,connect.garmin.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_minutes: i64,
    pub user_table: TableSource,
    pub audit_table: Option<TableSource>,
    pub google_credentials: PathBuf,
    pub sheets_api_base: String,
    pub cert_font_path: Option<PathBuf>,
    pub audit_utc_offset_minutes: i32,
    pub allowed_activity_hosts: Vec<String>,
    pub strava_access_token: Option<String>,
    pub strava_api_base: String,
    pub garmin_api_base: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingEnvironmentVariable(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingEnvironmentVariable(var) => {
                write!(f, "Missing required environment variable: {var}")
            }
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| ConfigError::MissingEnvironmentVariable("SESSION_SECRET".to_string()))?;

        if session_secret.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "SESSION_SECRET must be at least 32 characters long".to_string(),
            ));
        }

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("PORT must be a valid number".to_string()))?;

        let session_ttl_minutes = env::var("SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| "120".to_string())
            .parse::<i64>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SESSION_TTL_MINUTES must be a positive number".to_string(),
                )
            })?;

        let user_table = env::var("USER_TABLE")
            .unwrap_or_else(|_| "xlsx:users.xlsx".to_string())
            .parse::<TableSource>()
            .map_err(|e| ConfigError::InvalidValue(format!("USER_TABLE: {e}")))?;

        let audit_table = optional_var("AUDIT_TABLE")
            .map(|raw| raw.parse::<TableSource>())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue(format!("AUDIT_TABLE: {e}")))?;

        let google_credentials = PathBuf::from(
            env::var("GOOGLE_CREDENTIALS")
                .unwrap_or_else(|_| "google_credentials.json".to_string()),
        );

        let sheets_api_base = env::var("SHEETS_API_BASE")
            .unwrap_or_else(|_| "https://sheets.googleapis.com".to_string());

        let cert_font_path = match optional_var("CERT_FONT_PATH") {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let default = PathBuf::from(DEFAULT_FONT_PATH);
                default.exists().then_some(default)
            }
        };

        let audit_utc_offset_minutes = env::var("AUDIT_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "480".to_string())
            .parse::<i32>()
            .ok()
            .filter(|minutes| minutes.abs() < 24 * 60)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "AUDIT_UTC_OFFSET_MINUTES must be within +/- 1439".to_string(),
                )
            })?;

        let allowed_activity_hosts = parse_host_list(
            &env::var("ALLOWED_ACTIVITY_HOSTS").unwrap_or_else(|_| DEFAULT_ALLOWED_HOSTS.to_string()),
        );
        if allowed_activity_hosts.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ALLOWED_ACTIVITY_HOSTS must list at least one host".to_string(),
            ));
        }

        let strava_access_token = optional_var("STRAVA_ACCESS_TOKEN");

        let strava_api_base = env::var("STRAVA_API_BASE")
            .unwrap_or_else(|_| "https://www.strava.com/api/v3".to_string());

        let garmin_api_base = env::var("GARMIN_API_BASE")
            .unwrap_or_else(|_| "https://connect.garmin.com".to_string());

        Ok(Config {
            host,
            port,
            session_secret,
            session_ttl_minutes,
            user_table,
            audit_table,
            google_credentials,
            sheets_api_base,
            cert_font_path,
            audit_utc_offset_minutes,
            allowed_activity_hosts,
            strava_access_token,
            strava_api_base,
            garmin_api_base,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Splits a comma separated host list, lowercased and without blanks.
pub fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|host| host.trim().to_lowercase())
        .filter(|host| !host.is_empty())
        .collect()
}
