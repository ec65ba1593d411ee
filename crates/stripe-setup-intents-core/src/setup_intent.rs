//! Stripe SetupIntent resource types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::usage::SetupIntentUsage;

/// Stripe `SetupIntent` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupIntent {
    /// SetupIntent ID (`seti_...`).
    pub id: String,
    /// Object type (always "`setup_intent`").
    #[serde(default)]
    pub object: String,
    /// Secret handed to the frontend to complete the setup.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Customer ID.
    #[serde(default)]
    pub customer: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Current status.
    pub status: SetupIntentStatus,
    /// How the payment method will be used.
    #[serde(default)]
    pub usage: SetupIntentUsage,
    /// Attached payment method ID.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Payment method types this SetupIntent may use.
    #[serde(default)]
    pub payment_method_types: Vec<String>,
    /// Error from the last setup attempt.
    #[serde(default)]
    pub last_setup_error: Option<SetupError>,
    /// Action the customer must take (3D Secure redirect, etc.).
    #[serde(default)]
    pub next_action: Option<serde_json::Value>,
    /// Why the SetupIntent was canceled.
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    /// Mandate ID, for payment methods that need one.
    #[serde(default)]
    pub mandate: Option<String>,
    /// Latest SetupAttempt ID.
    #[serde(default)]
    pub latest_attempt: Option<String>,
    /// Metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
    /// Whether this object exists in live mode.
    #[serde(default)]
    pub livemode: bool,
}

impl SetupIntent {
    /// Creation time, if the timestamp is representable.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    /// Whether the SetupIntent can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            SetupIntentStatus::Succeeded | SetupIntentStatus::Canceled
        )
    }

    /// Whether the customer has to act before setup can continue.
    #[must_use]
    pub fn requires_action(&self) -> bool {
        self.status == SetupIntentStatus::RequiresAction
    }
}

/// SetupIntent status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupIntentStatus {
    /// No payment method attached yet, or the last one failed.
    RequiresPaymentMethod,
    /// Payment method attached, waiting for confirmation.
    RequiresConfirmation,
    /// Customer authentication needed.
    RequiresAction,
    /// Being processed asynchronously.
    Processing,
    /// Canceled.
    Canceled,
    /// Payment method saved.
    Succeeded,
    /// Status added by Stripe after this crate was written.
    #[serde(other)]
    Unknown,
}

/// Error from the last setup attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupError {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Card decline code.
    #[serde(default)]
    pub decline_code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Parameter that caused the error.
    #[serde(default)]
    pub param: Option<String>,
}

/// Stripe list response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeList<T> {
    /// Object type (always "list").
    pub object: String,
    /// Data items.
    pub data: Vec<T>,
    /// Whether there are more items.
    pub has_more: bool,
    /// URL for the list endpoint.
    #[serde(default)]
    pub url: Option<String>,
}
