use bigdecimal::BigDecimal;
use chrono::NaiveTime;
use std::fmt;

pub const MIN_SESSION_DURATION_MINUTES: u32 = 10;
pub const MIN_BUFFER_INTERVAL_MINUTES: u32 = 10;
pub const MIN_EVALUATION_SCORE: u8 = 1;
pub const MAX_EVALUATION_SCORE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Parse a 24-hour "HH:mm" string.
pub fn parse_hhmm(field: &'static str, value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ValidationError::new(field, format!("'{}' is not a valid HH:mm time", value)))
}

pub fn validate_weekdays(field: &'static str, days: &[u8]) -> ValidationResult {
    if days.is_empty() {
        return Err(ValidationError::new(field, "must contain at least one weekday"));
    }

    if let Some(bad) = days.iter().find(|d| **d > 6) {
        return Err(ValidationError::new(
            field,
            format!("weekday {} is out of range 0-6", bad),
        ));
    }

    Ok(())
}

pub fn validate_session_duration(minutes: u32) -> ValidationResult {
    if minutes < MIN_SESSION_DURATION_MINUTES {
        return Err(ValidationError::new(
            "session_duration_minutes",
            format!("must be at least {} minutes", MIN_SESSION_DURATION_MINUTES),
        ));
    }

    Ok(())
}

pub fn validate_buffer_interval(minutes: u32) -> ValidationResult {
    if minutes < MIN_BUFFER_INTERVAL_MINUTES {
        return Err(ValidationError::new(
            "buffer_interval_minutes",
            format!("must be at least {} minutes", MIN_BUFFER_INTERVAL_MINUTES),
        ));
    }

    Ok(())
}

pub fn validate_fee_percentage(value: &BigDecimal) -> ValidationResult {
    if value < &BigDecimal::from(0) || value > &BigDecimal::from(1) {
        return Err(ValidationError::new(
            "cancellation_fee_percentage",
            "must be a fraction between 0 and 1",
        ));
    }

    Ok(())
}

pub fn validate_score(score: u8) -> ValidationResult {
    if !(MIN_EVALUATION_SCORE..=MAX_EVALUATION_SCORE).contains(&score) {
        return Err(ValidationError::new(
            "score",
            format!(
                "must be between {} and {}",
                MIN_EVALUATION_SCORE, MAX_EVALUATION_SCORE
            ),
        ));
    }

    Ok(())
}
