pub mod csv_table;
pub mod sheets;
pub mod worksheet;
pub mod xlsx_table;

use axum::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{Participant, PrintRecord};

pub use csv_table::CsvUserTable;
pub use sheets::{ServiceAccountKey, SheetsUserTable};
pub use worksheet::{CellUpdate, Worksheet};
pub use xlsx_table::XlsxUserTable;

const DEFAULT_SHEET_NAME: &str = "users";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] calamine::XlsxError),
    #[error("Sheets API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sheets API error: {0}")]
    Api(String),
    #[error("Credential error: {0}")]
    Credentials(String),
    #[error("Assertion signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Worksheet not found: {0}")]
    MissingSheet(String),
    #[error("Participant not found")]
    ParticipantNotFound,
    #[error("Table is read-only")]
    ReadOnly,
    #[error("Invalid table descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A spreadsheet holding participant credentials and print records.
#[async_trait]
pub trait UserTable: Send + Sync {
    async fn find_participant(&self, id_card: &str) -> Result<Option<Participant>, StoreError>;

    /// Stores the timestamp and URL of the latest certificate in the
    /// participant's row.
    async fn record_print(&self, id_card: &str, record: &PrintRecord) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    fn is_writable(&self) -> bool;

    fn describe(&self) -> String;
}

/// Where a user table lives, parsed from `csv:<path>`, `xlsx:<path>[#sheet]`
/// or `sheets:<spreadsheet id>[#sheet]`. A bare path ending in `.csv` or
/// `.xlsx` is accepted too.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Csv(PathBuf),
    Xlsx {
        path: PathBuf,
        sheet: Option<String>,
    },
    Sheets {
        spreadsheet_id: String,
        sheet: String,
    },
}

impl FromStr for TableSource {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (kind, rest) = match raw.split_once(':') {
            Some((kind, rest)) if matches!(kind, "csv" | "xlsx" | "sheets") => (kind, rest),
            _ if raw.to_lowercase().ends_with(".csv") => ("csv", raw),
            _ if raw.to_lowercase().ends_with(".xlsx") => ("xlsx", raw),
            _ => return Err(StoreError::InvalidDescriptor(raw.to_string())),
        };

        let (location, sheet) = match rest.rsplit_once('#') {
            Some((location, sheet)) if !sheet.trim().is_empty() => {
                (location.trim(), Some(sheet.trim().to_string()))
            }
            _ => (rest.trim(), None),
        };
        if location.is_empty() {
            return Err(StoreError::InvalidDescriptor(raw.to_string()));
        }

        Ok(match kind {
            "csv" => TableSource::Csv(PathBuf::from(location)),
            "xlsx" => TableSource::Xlsx {
                path: PathBuf::from(location),
                sheet,
            },
            _ => TableSource::Sheets {
                spreadsheet_id: location.to_string(),
                sheet: sheet.unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            },
        })
    }
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSource::Csv(path) => write!(f, "csv:{}", path.display()),
            TableSource::Xlsx { path, sheet: None } => write!(f, "xlsx:{}", path.display()),
            TableSource::Xlsx {
                path,
                sheet: Some(sheet),
            } => write!(f, "xlsx:{}#{sheet}", path.display()),
            TableSource::Sheets {
                spreadsheet_id,
                sheet,
            } => write!(f, "sheets:{spreadsheet_id}#{sheet}"),
        }
    }
}

/// Opens the table described by `source`.
pub fn open_table(source: &TableSource, config: &Config) -> Result<Arc<dyn UserTable>, StoreError> {
    tracing::info!("Opening user table {}", source);

    let table: Arc<dyn UserTable> = match source {
        TableSource::Csv(path) => Arc::new(CsvUserTable::new(path.clone())),
        TableSource::Xlsx { path, sheet } => {
            Arc::new(XlsxUserTable::new(path.clone(), sheet.clone()))
        }
        TableSource::Sheets {
            spreadsheet_id,
            sheet,
        } => {
            let key = ServiceAccountKey::from_file(&config.google_credentials)?;
            Arc::new(SheetsUserTable::new(
                key,
                spreadsheet_id.clone(),
                sheet.clone(),
                config.sheets_api_base.clone(),
            ))
        }
    };

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixed_descriptors() {
        assert_eq!(
            "csv:data/users.csv".parse::<TableSource>().unwrap(),
            TableSource::Csv(PathBuf::from("data/users.csv"))
        );
        assert_eq!(
            "xlsx:users.xlsx#報名".parse::<TableSource>().unwrap(),
            TableSource::Xlsx {
                path: PathBuf::from("users.xlsx"),
                sheet: Some("報名".to_string())
            }
        );
        assert_eq!(
            "sheets:1AbCdEf".parse::<TableSource>().unwrap(),
            TableSource::Sheets {
                spreadsheet_id: "1AbCdEf".to_string(),
                sheet: "users".to_string()
            }
        );
    }

    #[test]
    fn test_parse_bare_paths() {
        assert_eq!(
            "users.CSV".parse::<TableSource>().unwrap(),
            TableSource::Csv(PathBuf::from("users.CSV"))
        );
        assert_eq!(
            "users.xlsx".parse::<TableSource>().unwrap(),
            TableSource::Xlsx {
                path: PathBuf::from("users.xlsx"),
                sheet: None
            }
        );
    }

    #[test]
    fn test_parse_invalid_descriptors() {
        assert!("mysql:users".parse::<TableSource>().is_err());
        assert!("csv:".parse::<TableSource>().is_err());
        assert!("users".parse::<TableSource>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for raw in ["csv:users.csv", "xlsx:users.xlsx#users", "sheets:abc#users"] {
            assert_eq!(raw.parse::<TableSource>().unwrap().to_string(), raw);
        }
    }
}
