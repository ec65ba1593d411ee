//! Idempotency keys for mutating Stripe requests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Longest idempotency key Stripe accepts.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// A validated value for the `Idempotency-Key` request header.
///
/// Retrying a request with the same key returns the original result instead
/// of creating a second SetupIntent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Create a key from a caller-supplied value.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidIdempotencyKey` if the key is blank, holds a
    /// control character, or is longer than [`MAX_IDEMPOTENCY_KEY_LEN`]
    /// characters.
    pub fn new(key: impl Into<String>) -> Result<Self, CoreError> {
        let key = key.into();

        if key.trim().is_empty() {
            return Err(CoreError::InvalidIdempotencyKey(
                "key must not be empty".to_string(),
            ));
        }

        // Control characters are not valid in an HTTP header value.
        if key.chars().any(char::is_control) {
            return Err(CoreError::InvalidIdempotencyKey(
                "key must not contain control characters".to_string(),
            ));
        }

        let len = key.chars().count();
        if len > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(CoreError::InvalidIdempotencyKey(format!(
                "key is {len} characters, max is {MAX_IDEMPOTENCY_KEY_LEN}"
            )));
        }

        Ok(Self(key))
    }

    /// Generate a fresh random key prefixed with the operation name.
    #[must_use]
    pub fn generate(operation: &str) -> Self {
        Self(format!("{operation}_{}", uuid::Uuid::new_v4()))
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for IdempotencyKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdempotencyKey> for String {
    fn from(key: IdempotencyKey) -> Self {
        key.0
    }
}
