use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavEngineError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No NAV available for {date} ({context})")]
    NavUnavailable { date: NaiveDate, context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl NavEngineError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        NavEngineError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for NavEngineError {
    fn from(e: serde_json::Error) -> Self {
        NavEngineError::SerializationError(e.to_string())
    }
}
