use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesAnalyticsError {
    #[error("Unrecognized payment date '{input}': {reason}")]
    DateParse { input: String, reason: String },

    #[error("Invalid analytics request: {0}")]
    InvalidRequest(String),

    #[error("Invalid top N {0}: must be at least 1")]
    InvalidTopN(usize),

    #[error("Invalid page size {0}: must be at least 1")]
    InvalidPageSize(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SalesAnalyticsError>;
