use std::collections::BTreeMap;

pub const MAX_URL_LENGTH: usize = 2048;
const MAX_CREDENTIAL_LENGTH: usize = 64;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// Collection of validation errors, keyed by form field
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: &str, message: String) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The message to show when only one can be displayed.
    pub fn first_message(&self) -> Option<&str> {
        self.errors
            .values()
            .flat_map(|messages| messages.iter())
            .map(String::as_str)
            .next()
    }

    fn merge(&mut self, prefix: &str, other: ValidationErrors) {
        for (field, messages) in other.errors {
            for message in messages {
                self.add_error(&format!("{prefix}.{field}"), message);
            }
        }
    }

    fn into_result(self) -> ValidationResult<()> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }
}

/// Validator trait for implementing custom validation logic
pub trait Validator<T: ?Sized> {
    fn validate(&self, value: &T) -> ValidationResult<()>;
}

/// Required field validator
pub struct RequiredValidator {
    message: String,
}

impl RequiredValidator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Validator<str> for RequiredValidator {
    fn validate(&self, value: &str) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        if value.trim().is_empty() {
            errors.add_error("required", self.message.clone());
        }
        errors.into_result()
    }
}

/// String length validator
pub struct StringLengthValidator {
    max_length: usize,
}

impl StringLengthValidator {
    pub fn max(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Validator<str> for StringLengthValidator {
    fn validate(&self, value: &str) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        if value.chars().count() > self.max_length {
            errors.add_error(
                "length",
                format!("Must be no more than {} characters long", self.max_length),
            );
        }
        errors.into_result()
    }
}

/// Checks that a submitted activity link is an absolute http(s) URL. Which
/// hosts and paths are accepted is decided when the link is resolved.
pub struct ActivityUrlValidator;

impl Validator<str> for ActivityUrlValidator {
    fn validate(&self, value: &str) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        match url::Url::parse(value.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => errors.add_error("format", "Please enter a valid URL".to_string()),
        }
        errors.into_result()
    }
}

/// Collection of common validation functions
pub mod validators {
    use super::*;

    /// Validate the login form
    pub fn validate_login(id_card: &str, phone: &str) -> ValidationResult<()> {
        let mut all_errors = ValidationErrors::new();

        for (field, value, message) in [
            ("username", id_card, "Please enter your ID number"),
            ("password", phone, "Please enter your phone number"),
        ] {
            if let Err(errors) = RequiredValidator::new(message).validate(value) {
                all_errors.merge(field, errors);
            } else if let Err(errors) = StringLengthValidator::max(MAX_CREDENTIAL_LENGTH).validate(value) {
                all_errors.merge(field, errors);
            }
        }

        all_errors.into_result()
    }

    /// Validate the activity link submitted for a certificate
    pub fn validate_activity_url(raw: &str) -> ValidationResult<()> {
        let mut all_errors = ValidationErrors::new();

        if let Err(errors) = RequiredValidator::new("Please enter a valid URL").validate(raw) {
            all_errors.merge("url", errors);
            return all_errors.into_result();
        }

        if let Err(errors) = StringLengthValidator::max(MAX_URL_LENGTH).validate(raw) {
            all_errors.merge("url", errors);
        }
        if let Err(errors) = ActivityUrlValidator.validate(raw) {
            all_errors.merge("url", errors);
        }

        all_errors.into_result()
    }
}
