//! Stripe client configuration.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::{Result, StripeError};

/// Stripe API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Places a `stripe.json` secrets file is looked up, in order.
const SECRET_PATHS: [&str; 3] = [
    ".secrets/stripe.json",
    "../.secrets/stripe.json",
    "../../.secrets/stripe.json",
];

/// Configuration for the Stripe transport.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (`sk_test_...` or `sk_live_...`).
    pub api_key: String,

    /// API base URL (default: `https://api.stripe.com/v1`).
    pub api_base: String,

    /// Pinned API version sent as `Stripe-Version` (optional).
    pub api_version: Option<String>,

    /// Connected account sent as `Stripe-Account` (optional).
    pub stripe_account: Option<String>,

    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default)]
    stripe_account: Option<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

impl StripeConfig {
    /// Create a configuration with default values for everything but the key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: None,
            stripe_account: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Pin the API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Act on behalf of a connected account.
    #[must_use]
    pub fn with_stripe_account(mut self, account: impl Into<String>) -> Self {
        self.stripe_account = Some(account.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Load configuration from a secrets file or environment variables.
    ///
    /// Secrets files are tried first; `STRIPE_API_KEY`, `STRIPE_API_BASE`,
    /// `STRIPE_API_VERSION`, `STRIPE_ACCOUNT` and `STRIPE_TIMEOUT_SECONDS`
    /// are used otherwise.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Configuration` if no API key is found.
    pub fn from_env() -> Result<Self> {
        for path in &SECRET_PATHS {
            if !Path::new(path).exists() {
                continue;
            }
            match Self::from_secrets_file(path) {
                Ok(config) => {
                    tracing::info!(path = %path, "Loaded Stripe secrets from file");
                    return Ok(config);
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Ignoring unreadable Stripe secrets file");
                }
            }
        }

        tracing::debug!("Stripe secrets file not found, using environment variables");
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build configuration from `STRIPE_*` variables supplied by `get`.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Configuration` if `STRIPE_API_KEY` is missing,
    /// `STRIPE_TIMEOUT_SECONDS` is not a number, or the result is invalid.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = get("STRIPE_API_KEY")
            .ok_or_else(|| StripeError::Configuration("STRIPE_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Some(base) = get("STRIPE_API_BASE") {
            config = config.with_api_base(base);
        }
        config.api_version = get("STRIPE_API_VERSION");
        config.stripe_account = get("STRIPE_ACCOUNT");
        if let Some(timeout) = get("STRIPE_TIMEOUT_SECONDS") {
            config.timeout_seconds = timeout.trim().parse().map_err(|_| {
                StripeError::Configuration(format!(
                    "STRIPE_TIMEOUT_SECONDS is not a number of seconds: {timeout}"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON secrets file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn from_secrets_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StripeError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let secrets: StripeSecrets = serde_json::from_str(&contents)?;

        let mut config = Self::new(secrets.api_key);
        if let Some(base) = secrets.api_base {
            config = config.with_api_base(base);
        }
        config.api_version = secrets.api_version;
        config.stripe_account = secrets.stripe_account;
        if let Some(timeout) = secrets.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Configuration` for a blank key, blank base URL or
    /// zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(StripeError::Configuration("API key is empty".into()));
        }
        if self.api_base.trim().is_empty() {
            return Err(StripeError::Configuration("API base URL is empty".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(StripeError::Configuration(
                "timeout must be at least one second".into(),
            ));
        }
        Ok(())
    }

    /// Whether the key is a test mode key.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_") || self.api_key.starts_with("rk_test_")
    }
}

// The API key never shows up in logs.
impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("stripe_account", &self.stripe_account)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("is_test_mode", &self.is_test_mode())
            .finish_non_exhaustive()
    }
}
