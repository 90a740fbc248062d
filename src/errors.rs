use thiserror::Error;

/// Fixed reply sent for any failure past validation (store, timeout, internal).
pub const GENERIC_FAILURE_REPLY: &str = "Failed to compute the series, try again later";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed request payload: {0}")]
    MalformedInput(String),

    #[error("Unknown grouping type: {0}")]
    InvalidGrouping(String),

    #[error("Invalid timestamp {0:?}: {1}")]
    DateParseFailure(String, String),

    #[error("dt_from {0} is later than dt_upto {1}")]
    InvalidRange(String, String),

    #[error("Aggregation query failed: {0}")]
    QueryFailure(String),

    #[error("Aggregation query timed out after {0}s")]
    QueryTimeout(u64),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// User-facing reply text per variant.
    ///
    /// The first two strings are part of the bot contract and must not change.
    pub fn user_reply(&self) -> &'static str {
        match self {
            AppError::MalformedInput(_) => "No valid data provided",
            AppError::InvalidGrouping(_) => "No valid grouping type provided",
            AppError::DateParseFailure(_, _) => "No valid date format provided",
            AppError::InvalidRange(_, _) => "dt_from must not be later than dt_upto",
            AppError::QueryFailure(_)
            | AppError::QueryTimeout(_)
            | AppError::InternalError(_) => GENERIC_FAILURE_REPLY,
        }
    }

    /// Whether the failure is worth an operator-level log line, as opposed to
    /// plain user input noise.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            AppError::QueryFailure(_) | AppError::QueryTimeout(_) | AppError::InternalError(_)
        )
    }
}
