//! Error types for the core crate.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while constructing core values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The string is not a known SetupIntent usage.
    #[error("invalid setup intent usage: {0}")]
    InvalidUsage(String),

    /// The idempotency key is empty or too long.
    #[error("invalid idempotency key: {0}")]
    InvalidIdempotencyKey(String),
}
