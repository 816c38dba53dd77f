use serde::{Deserialize, Serialize};

/// A registered participant as read from the user table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Participant {
    pub id_card: String,
    pub phone: String,
    pub name: String,
    pub user_number: String,
    pub last_print: Option<String>,
    pub uploaded_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// The participant's ID number.
    #[serde(default)]
    pub username: String,
    /// The participant's phone number.
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ParticipantError {
    #[error("Participant not found")]
    ParticipantNotFound,
    #[error("Invalid ID number or phone number")]
    InvalidCredentials,
}

impl Participant {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "N/A"
        } else {
            &self.name
        }
    }

    pub fn display_number(&self) -> &str {
        if self.user_number.is_empty() {
            "N/A"
        } else {
            &self.user_number
        }
    }

    pub fn verify_phone(&self, supplied: &str) -> Result<(), ParticipantError> {
        if phones_match(&self.phone, supplied) {
            Ok(())
        } else {
            Err(ParticipantError::InvalidCredentials)
        }
    }
}

/// Compares two phone numbers by their digits.
///
/// Spreadsheet tools store phones as numbers and drop the leading zero, so
/// `912345678` and `0912-345-678` are the same phone. A value with no digits
/// never matches.
pub fn phones_match(stored: &str, supplied: &str) -> bool {
    let stored = significant_digits(stored);
    let supplied = significant_digits(supplied);
    !stored.is_empty() && stored == supplied
}

fn significant_digits(phone: &str) -> String {
    let phone = phone.trim();
    // A float cell rendered as text, e.g. "912345678.0"
    let phone = phone.strip_suffix(".0").unwrap_or(phone);
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.trim_start_matches('0').to_string()
}
