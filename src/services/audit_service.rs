use chrono::{FixedOffset, Utc};
use std::sync::Arc;

use crate::models::PrintRecord;
use crate::store::{StoreError, UserTable};
use crate::utils::responses::Flash;

/// Result of writing a print record back to the audit table.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    Recorded,
    NotFound,
    Disconnected,
    Failed(String),
}

impl AuditOutcome {
    /// The message shown to the participant on their next page view.
    pub fn flash(&self) -> Flash {
        match self {
            AuditOutcome::Recorded => Flash::success("Certificate generated and recorded"),
            AuditOutcome::NotFound => {
                Flash::warning("Your record was not found in the audit table")
            }
            AuditOutcome::Disconnected => Flash::warning("Audit table not connected"),
            AuditOutcome::Failed(message) => {
                Flash::danger(format!("Failed to update audit table: {message}"))
            }
        }
    }
}

/// Records who printed a certificate and from which activity.
///
/// Failures are reported, never raised: a broken audit table must not keep a
/// participant from downloading their certificate.
pub struct AuditService {
    table: Option<Arc<dyn UserTable>>,
    offset: FixedOffset,
}

impl AuditService {
    pub fn new(table: Option<Arc<dyn UserTable>>, offset: FixedOffset) -> Self {
        Self { table, offset }
    }

    pub fn is_connected(&self) -> bool {
        self.table.is_some()
    }

    pub fn describe(&self) -> Option<String> {
        self.table.as_ref().map(|table| table.describe())
    }

    pub async fn record(&self, id_card: &str, uploaded_url: &str) -> AuditOutcome {
        let Some(table) = &self.table else {
            tracing::warn!("Audit table not connected, skipping print record");
            return AuditOutcome::Disconnected;
        };

        let record = PrintRecord::new(Utc::now(), self.offset, uploaded_url);
        match table.record_print(id_card, &record).await {
            Ok(()) => {
                tracing::info!("Recorded certificate print at {}", record.printed_at);
                AuditOutcome::Recorded
            }
            Err(StoreError::ParticipantNotFound) => {
                tracing::warn!("Participant missing from audit table {}", table.describe());
                AuditOutcome::NotFound
            }
            Err(e) => {
                tracing::error!("Failed to write audit record: {}", e);
                AuditOutcome::Failed(e.to_string())
            }
        }
    }
}
