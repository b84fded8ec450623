use thiserror::Error;

#[derive(Debug, Error)]
pub enum TributoError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid rate table configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for TributoError {
    fn from(e: serde_json::Error) -> Self {
        TributoError::SerializationError(e.to_string())
    }
}
