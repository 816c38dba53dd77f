use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The two cells written back to the user table after a certificate is issued.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PrintRecord {
    pub printed_at: String,
    pub uploaded_url: String,
}

impl PrintRecord {
    pub fn new(printed_at: DateTime<Utc>, offset: FixedOffset, uploaded_url: &str) -> Self {
        Self {
            printed_at: printed_at
                .with_timezone(&offset)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            uploaded_url: uploaded_url.to_string(),
        }
    }
}
