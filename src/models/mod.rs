pub mod activity;
pub mod audit_log;
pub mod participant;

pub use activity::{ActivitySource, ActivityStats};
pub use audit_log::PrintRecord;
pub use participant::{LoginRequest, Participant, ParticipantError};
