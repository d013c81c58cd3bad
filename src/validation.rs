// Validation utilities module
// Provides custom validation functions for domain-specific rules

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

const PHONE_PATTERN: &str = r"^\+?[0-9]{7,15}$";

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern compiles"))
}

/// Validates a phone number: optional leading `+` then 7 to 15 digits
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone_regex().is_match(phone) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_phone");
        error.message = Some("Phone number must be 7 to 15 digits, optionally prefixed with +".into());
        Err(error)
    }
}

/// Validates that a value is strictly positive and finite
pub fn validate_positive(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        let mut error = ValidationError::new("must_be_positive");
        error.message = Some("Value must be greater than zero".into());
        Err(error)
    }
}
