//! Mandate data for payment methods that need customer authorization.
//!
//! Bank debits (SEPA, BACS, ACSS) require proof that the customer accepted
//! the mandate. Stripe takes it as nested form parameters under
//! `mandate_data[customer_acceptance]`.

use serde::{Deserialize, Serialize};

/// Mandate information attached when creating a SetupIntent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateDataOptions {
    /// How and when the customer accepted the mandate.
    pub customer_acceptance: CustomerAcceptance,
}

/// Customer acceptance details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAcceptance {
    /// Unix timestamp of acceptance. Stripe uses the request time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<i64>,

    /// Online or offline acceptance.
    #[serde(flatten)]
    pub acceptance: AcceptanceType,
}

/// The way the mandate was accepted.
///
/// Serializes like Stripe's object: `{"type": "online", "online": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AcceptanceType {
    /// Accepted in a browser or app session.
    Online {
        /// Where the customer accepted from.
        online: OnlineAcceptance,
    },

    /// Accepted on paper or by phone.
    Offline,
}

/// Details of an online acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineAcceptance {
    /// IP address the customer accepted from.
    pub ip_address: String,
    /// User agent of the accepting browser.
    pub user_agent: String,
}

impl MandateDataOptions {
    /// Mandate accepted online.
    #[must_use]
    pub fn online(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            customer_acceptance: CustomerAcceptance {
                accepted_at: None,
                acceptance: AcceptanceType::Online {
                    online: OnlineAcceptance {
                        ip_address: ip_address.into(),
                        user_agent: user_agent.into(),
                    },
                },
            },
        }
    }

    /// Mandate accepted offline.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            customer_acceptance: CustomerAcceptance {
                accepted_at: None,
                acceptance: AcceptanceType::Offline,
            },
        }
    }

    /// Set the acceptance timestamp.
    #[must_use]
    pub fn with_accepted_at(mut self, accepted_at: i64) -> Self {
        self.customer_acceptance.accepted_at = Some(accepted_at);
        self
    }

    /// Encode as Stripe form parameters.
    #[must_use]
    pub fn to_form_params(&self) -> Vec<(String, String)> {
        const PREFIX: &str = "mandate_data[customer_acceptance]";

        let acceptance = &self.customer_acceptance;
        let mut params = Vec::with_capacity(4);

        match &acceptance.acceptance {
            AcceptanceType::Online { online } => {
                params.push((format!("{PREFIX}[type]"), "online".to_string()));
                params.push((
                    format!("{PREFIX}[online][ip_address]"),
                    online.ip_address.clone(),
                ));
                params.push((
                    format!("{PREFIX}[online][user_agent]"),
                    online.user_agent.clone(),
                ));
            }
            AcceptanceType::Offline => {
                params.push((format!("{PREFIX}[type]"), "offline".to_string()));
            }
        }

        if let Some(accepted_at) = acceptance.accepted_at {
            params.push((format!("{PREFIX}[accepted_at]"), accepted_at.to_string()));
        }

        params
    }
}
