use axum::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tokio::sync::Mutex;
use url::Url;

use crate::models::{Participant, PrintRecord};
use crate::store::worksheet::{column_letter, format_number};
use crate::store::{StoreError, UserTable, Worksheet};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The fields of a Google service-account key file we need.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Credentials(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| StoreError::Credentials(format!("{}: {e}", path.display())))
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// A user table in a Google Sheets worksheet, reached through the Sheets v4
/// REST API with a service account.
pub struct SheetsUserTable {
    client: Client,
    key: ServiceAccountKey,
    spreadsheet_id: String,
    sheet: String,
    api_base: String,
    token: Mutex<Option<CachedToken>>,
    write_lock: Mutex<()>,
}

impl SheetsUserTable {
    pub fn new(
        key: ServiceAccountKey,
        spreadsheet_id: String,
        sheet: String,
        api_base: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            key,
            spreadsheet_id,
            sheet,
            api_base,
            token: Mutex::new(None),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns a cached access token, exchanging a fresh signed assertion
    /// when the cached one is within a minute of expiry.
    async fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(60) > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)?;

        tracing::debug!("Requesting Sheets access token for {}", self.key.client_email);
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StoreError::Credentials(format!(
                "token exchange returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: now + Duration::seconds(token.expires_in),
        });

        Ok(token.access_token)
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| StoreError::Api(format!("invalid API base {}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Api(format!("invalid API base {}", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// The sheet name quoted for A1 notation.
    fn quoted_sheet(&self) -> String {
        format!("'{}'", self.sheet.replace('\'', "''"))
    }

    async fn load(&self) -> Result<Worksheet, StoreError> {
        let token = self.access_token().await?;
        let url = self.api_url(&["values", &self.quoted_sheet()])?;

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let range: ValueRange = check_status(response).await?.json().await?;

        let rows = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(value_text).collect())
            .collect();
        Ok(Worksheet::new(rows))
    }
}

#[async_trait]
impl UserTable for SheetsUserTable {
    async fn find_participant(&self, id_card: &str) -> Result<Option<Participant>, StoreError> {
        self.load().await?.participant(id_card)
    }

    async fn record_print(&self, id_card: &str, record: &PrintRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut worksheet = self.load().await?;
        let updates = worksheet.apply_print(id_card, record)?;

        let sheet = self.quoted_sheet();
        let data: Vec<Value> = updates
            .iter()
            .map(|update| {
                json!({
                    "range": format!("{sheet}!{}{}", column_letter(update.column), update.row + 1),
                    "values": [[update.value]],
                })
            })
            .collect();

        let token = self.access_token().await?;
        let url = self.api_url(&["values:batchUpdate"])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "valueInputOption": "RAW", "data": data }))
            .send()
            .await?;
        check_status(response).await?;

        tracing::debug!("Updated {} cell(s) in {}", updates.len(), self.describe());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.load().await.map(|_| ())
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("sheets:{}#{}", self.spreadsheet_id, self.sheet)
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(StoreError::Api(format!("{status}: {body}")))
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| number.to_string()),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
