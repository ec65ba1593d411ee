//! SetupIntent usage.
//!
//! Stripe accepts exactly two values for `usage`. Keeping them in an enum
//! means a typo can never reach the API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Indicates how the payment method will be used once saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupIntentUsage {
    /// Used immediately while the customer is present.
    OnSession,

    /// Used later without the customer present (renewals, auto-recharges).
    #[default]
    OffSession,
}

impl SetupIntentUsage {
    /// Get the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnSession => "on_session",
            Self::OffSession => "off_session",
        }
    }

    /// All known usage values.
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::OnSession, Self::OffSession]
    }
}

impl fmt::Display for SetupIntentUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetupIntentUsage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_session" => Ok(Self::OnSession),
            "off_session" => Ok(Self::OffSession),
            other => Err(CoreError::InvalidUsage(other.to_string())),
        }
    }
}
