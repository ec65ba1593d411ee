//! Stripe API transport.
//!
//! A small form-encoding HTTP client that knows Stripe's authentication,
//! header and error conventions. Resource modules build on top of it.

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use stripe_setup_intents_core::IdempotencyKey;

use crate::config::StripeConfig;
use crate::error::{Result, StripeError};

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
struct StripeErrorResponse {
    error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    param: Option<String>,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_base: Url,
    api_key: String,
    api_version: Option<String>,
    stripe_account: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Configuration` if the configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: &StripeConfig) -> Result<Self> {
        config.validate()?;

        let api_base = Url::parse(&config.api_base).map_err(|e| {
            StripeError::Configuration(format!("invalid API base URL {}: {e}", config.api_base))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(StripeError::Configuration(format!(
                "API base URL cannot carry a path: {}",
                config.api_base
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("stripe-setup-intents/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StripeError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            stripe_account: config.stripe_account.clone(),
        })
    }

    /// Send a `GET` request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe returns an error.
    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<T> {
        let request = self.request(Method::GET, segments)?.query(query);
        let response = request.send().await?;

        Self::handle_response(response).await
    }

    /// Send a form-encoded `POST` request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe returns an error.
    pub async fn post<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        form: &[(String, String)],
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<T> {
        let mut request = self.request(Method::POST, segments)?.form(form);

        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key.as_str());
        }

        let response = request.send().await?;

        Self::handle_response(response).await
    }

    /// Build a URL from the API base plus escaped path segments.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| StripeError::Configuration("API base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start an authenticated request.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;

        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&self.api_key, Option::<&str>::None);

        if let Some(ref version) = self.api_version {
            request = request.header("Stripe-Version", version);
        }
        if let Some(ref account) = self.stripe_account {
            request = request.header("Stripe-Account", account);
        }

        Ok(request)
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        // Try to parse error response
        let error_body: std::result::Result<StripeErrorResponse, _> = response.json().await;

        let error = match error_body {
            Ok(stripe_error) => StripeError::Api {
                status: status.as_u16(),
                error_type: stripe_error.error.error_type,
                message: stripe_error
                    .error
                    .message
                    .unwrap_or_else(|| format!("HTTP {status}")),
                code: stripe_error.error.code,
                param: stripe_error.error.param,
            },
            Err(_) => StripeError::Api {
                status: status.as_u16(),
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
                param: None,
            },
        };

        tracing::debug!(status = %status, error = %error, "Stripe request failed");
        Err(error)
    }
}

// Debug implementation that doesn't expose the API key
impl fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base.as_str())
            .field("api_version", &self.api_version)
            .field("stripe_account", &self.stripe_account)
            .finish_non_exhaustive()
    }
}
