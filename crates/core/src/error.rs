//! Errors raised when building or validating domain records.

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while constructing or validating records.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A record failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Priority outside 1..=100
    #[error("Priority must be between 1 and 100, got {0}")]
    InvalidPriority(u8),

    /// Actionability hints could not be parsed
    #[error("Invalid actionability hints: {0}")]
    Actionability(#[from] serde_json::Error),

    /// Deadline operation on a goal without an end date
    #[error("Goal has no end date")]
    NoDeadline,

    /// Date arithmetic left the supported calendar range
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),
}

impl CoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
