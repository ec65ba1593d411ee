//! Stripe SetupIntents API.
//!
//! [`SetupIntentService`] maps one method to one endpoint. [`StripeSetupIntents`]
//! is the convenience layer on top: default parameter values, idempotency
//! keys, auto-pagination, and a lazily built service handle shared by all
//! callers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use stripe_setup_intents_core::{
    IdempotencyKey, MandateDataOptions, SetupIntent, SetupIntentUsage, StripeList,
};

use crate::client::StripeClient;
use crate::error::{Result, StripeError};
use crate::provider::StripeClientProvider;
use crate::singleton::AsyncSingleton;

/// Resource path for SetupIntents.
const RESOURCE: &str = "setup_intents";

/// Page size used when listing.
pub const LIST_PAGE_SIZE: u32 = 100;

/// Parameters for creating a SetupIntent.
#[derive(Debug, Clone, Default)]
pub struct CreateSetupIntent {
    /// Customer the SetupIntent belongs to.
    pub customer: String,
    /// How the payment method will be used (default: `off_session`).
    pub usage: Option<SetupIntentUsage>,
    /// Confirm immediately, validating the attached payment method.
    pub confirm: bool,
    /// Payment method to attach and validate.
    pub payment_method: Option<String>,
    /// Payment method types allowed (Stripe's default when empty).
    pub payment_method_types: Vec<String>,
    /// Redirect target after confirmation (3D Secure and similar flows).
    pub return_url: Option<String>,
    /// Mandate information for bank debits.
    pub mandate_data: Option<MandateDataOptions>,
    /// Description.
    pub description: Option<String>,
    /// Metadata.
    pub metadata: HashMap<String, String>,
    /// Key guarding against duplicate creation on retry.
    pub idempotency_key: Option<IdempotencyKey>,
}

impl CreateSetupIntent {
    /// Start parameters for a customer, with all defaults.
    #[must_use]
    pub fn new(customer: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            ..Self::default()
        }
    }

    /// Set the usage.
    #[must_use]
    pub fn with_usage(mut self, usage: SetupIntentUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Confirm on creation.
    #[must_use]
    pub fn with_confirm(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    /// Attach a payment method.
    #[must_use]
    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }

    /// Restrict the payment method types.
    #[must_use]
    pub fn with_payment_method_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.payment_method_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the return URL.
    #[must_use]
    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }

    /// Attach mandate data.
    #[must_use]
    pub fn with_mandate_data(mut self, mandate_data: MandateDataOptions) -> Self {
        self.mandate_data = Some(mandate_data);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }

    /// Encode as Stripe form parameters.
    #[must_use]
    pub fn to_form_params(&self) -> Vec<(String, String)> {
        let usage = self.usage.unwrap_or_default();

        let mut params = vec![
            ("customer".to_string(), self.customer.clone()),
            ("usage".to_string(), usage.as_str().to_string()),
        ];

        if self.confirm {
            params.push(("confirm".to_string(), "true".to_string()));
        }
        if let Some(ref pm) = self.payment_method {
            params.push(("payment_method".to_string(), pm.clone()));
        }
        for (i, kind) in self.payment_method_types.iter().enumerate() {
            params.push((format!("payment_method_types[{i}]"), kind.clone()));
        }
        if let Some(ref url) = self.return_url {
            params.push(("return_url".to_string(), url.clone()));
        }
        if let Some(ref mandate) = self.mandate_data {
            params.extend(mandate.to_form_params());
        }
        if let Some(ref description) = self.description {
            params.push(("description".to_string(), description.clone()));
        }
        params.extend(metadata_params(&self.metadata));

        params
    }
}

/// Encode metadata as `metadata[key]=value`, sorted by key.
fn metadata_params(metadata: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut entries: Vec<_> = metadata.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(k, v)| (format!("metadata[{k}]"), v.clone()))
        .collect()
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StripeError::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Direct bindings for the `/setup_intents` endpoints.
#[derive(Debug, Clone)]
pub struct SetupIntentService {
    client: Arc<StripeClient>,
}

impl SetupIntentService {
    /// Create a service on top of a client.
    #[must_use]
    pub fn new(client: Arc<StripeClient>) -> Self {
        Self { client }
    }

    /// `POST /setup_intents`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe returns an error.
    pub async fn create(
        &self,
        form: &[(String, String)],
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<SetupIntent> {
        self.client.post(&[RESOURCE], form, idempotency_key).await
    }

    /// `GET /setup_intents/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe returns an error.
    pub async fn retrieve(&self, id: &str) -> Result<SetupIntent> {
        self.client.get(&[RESOURCE, id], &[]).await
    }

    /// `POST /setup_intents/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe returns an error.
    pub async fn update(&self, id: &str, form: &[(String, String)]) -> Result<SetupIntent> {
        self.client.post(&[RESOURCE, id], form, None).await
    }

    /// `POST /setup_intents/{id}/confirm`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe returns an error.
    pub async fn confirm(&self, id: &str, form: &[(String, String)]) -> Result<SetupIntent> {
        self.client.post(&[RESOURCE, id, "confirm"], form, None).await
    }

    /// `POST /setup_intents/{id}/cancel`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe returns an error.
    pub async fn cancel(&self, id: &str) -> Result<SetupIntent> {
        self.client.post(&[RESOURCE, id, "cancel"], &[], None).await
    }

    /// `GET /setup_intents`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe returns an error.
    pub async fn list(&self, query: &[(String, String)]) -> Result<StripeList<SetupIntent>> {
        self.client.get(&[RESOURCE], query).await
    }
}

/// Operations for managing SetupIntents: collecting and storing payment
/// methods (cards, bank debits) for later use, including off-session billing.
#[async_trait]
pub trait SetupIntentsApi: Send + Sync {
    /// Create a SetupIntent, optionally confirming it straight away.
    async fn create(&self, params: CreateSetupIntent) -> Result<SetupIntent>;

    /// Create and confirm a card SetupIntent for future off-session charges.
    async fn create_and_confirm_for_off_session_card(
        &self,
        customer_id: &str,
        payment_method_id: &str,
        return_url: Option<&str>,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<SetupIntent>;

    /// Retrieve a SetupIntent by ID.
    async fn get(&self, id: &str) -> Result<SetupIntent>;

    /// Cancel a SetupIntent that has not succeeded.
    async fn cancel(&self, id: &str) -> Result<SetupIntent>;

    /// Confirm a SetupIntent, optionally with a new payment method and return URL.
    async fn confirm(
        &self,
        id: &str,
        payment_method_id: Option<&str>,
        return_url: Option<&str>,
    ) -> Result<SetupIntent>;

    /// Set metadata on a SetupIntent. An empty value removes the key.
    async fn update(&self, id: &str, metadata: HashMap<String, String>) -> Result<SetupIntent>;

    /// List every SetupIntent of a customer, following pagination.
    async fn list(&self, customer_id: &str) -> Result<Vec<SetupIntent>>;
}

/// [`SetupIntentsApi`] backed by Stripe.
///
/// The underlying [`SetupIntentService`] is built on first use from the
/// provider's client and reused by every later call.
pub struct StripeSetupIntents {
    service: AsyncSingleton<SetupIntentService>,
}

impl StripeSetupIntents {
    /// Create the API on top of a client provider.
    #[must_use]
    pub fn new(provider: Arc<dyn StripeClientProvider>) -> Self {
        let service = AsyncSingleton::new(move || {
            let provider = Arc::clone(&provider);
            async move {
                let client = provider.get().await?;
                Ok(SetupIntentService::new(client))
            }
        });

        Self { service }
    }

    /// Drop the cached service handle. The next call builds a new one.
    pub async fn close(&self) {
        self.service.reset().await;
    }

    async fn service(&self) -> Result<Arc<SetupIntentService>> {
        self.service.get().await
    }
}

impl std::fmt::Debug for StripeSetupIntents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeSetupIntents")
            .field("service", &self.service)
            .finish()
    }
}

#[async_trait]
impl SetupIntentsApi for StripeSetupIntents {
    async fn create(&self, params: CreateSetupIntent) -> Result<SetupIntent> {
        require("customer", &params.customer)?;

        let form = params.to_form_params();

        tracing::debug!(
            customer = %params.customer,
            usage = %params.usage.unwrap_or_default(),
            confirm = params.confirm,
            idempotent = params.idempotency_key.is_some(),
            "Creating Stripe setup intent"
        );

        let intent = self
            .service()
            .await?
            .create(&form, params.idempotency_key.as_ref())
            .await?;

        tracing::info!(
            setup_intent = %intent.id,
            customer = %params.customer,
            status = ?intent.status,
            "Created Stripe setup intent"
        );

        Ok(intent)
    }

    async fn create_and_confirm_for_off_session_card(
        &self,
        customer_id: &str,
        payment_method_id: &str,
        return_url: Option<&str>,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<SetupIntent> {
        require("payment method", payment_method_id)?;

        let mut params = CreateSetupIntent::new(customer_id)
            .with_usage(SetupIntentUsage::OffSession)
            .with_confirm(true)
            .with_payment_method(payment_method_id)
            .with_payment_method_types(["card"]);

        if let Some(url) = return_url {
            params = params.with_return_url(url);
        }
        if let Some(key) = idempotency_key {
            params = params.with_idempotency_key(key);
        }

        self.create(params).await
    }

    async fn get(&self, id: &str) -> Result<SetupIntent> {
        require("setup intent id", id)?;

        tracing::debug!(setup_intent = %id, "Retrieving Stripe setup intent");
        self.service().await?.retrieve(id).await
    }

    async fn cancel(&self, id: &str) -> Result<SetupIntent> {
        require("setup intent id", id)?;

        let intent = self.service().await?.cancel(id).await?;
        tracing::info!(setup_intent = %id, "Canceled Stripe setup intent");

        Ok(intent)
    }

    async fn confirm(
        &self,
        id: &str,
        payment_method_id: Option<&str>,
        return_url: Option<&str>,
    ) -> Result<SetupIntent> {
        require("setup intent id", id)?;

        let mut form = Vec::with_capacity(2);
        if let Some(pm) = payment_method_id {
            form.push(("payment_method".to_string(), pm.to_string()));
        }
        if let Some(url) = return_url {
            form.push(("return_url".to_string(), url.to_string()));
        }

        let intent = self.service().await?.confirm(id, &form).await?;
        tracing::info!(
            setup_intent = %id,
            status = ?intent.status,
            "Confirmed Stripe setup intent"
        );

        Ok(intent)
    }

    async fn update(&self, id: &str, metadata: HashMap<String, String>) -> Result<SetupIntent> {
        require("setup intent id", id)?;

        let form = metadata_params(&metadata);

        tracing::debug!(setup_intent = %id, keys = form.len(), "Updating Stripe setup intent");
        self.service().await?.update(id, &form).await
    }

    async fn list(&self, customer_id: &str) -> Result<Vec<SetupIntent>> {
        require("customer", customer_id)?;

        let service = self.service().await?;
        let mut intents = Vec::new();
        let mut starting_after: Option<String> = None;

        loop {
            let mut query = vec![
                ("customer".to_string(), customer_id.to_string()),
                ("limit".to_string(), LIST_PAGE_SIZE.to_string()),
            ];
            if let Some(ref cursor) = starting_after {
                query.push(("starting_after".to_string(), cursor.clone()));
            }

            let page = service.list(&query).await?;
            let has_more = page.has_more;
            starting_after = page.data.last().map(|intent| intent.id.clone());
            intents.extend(page.data);

            if !has_more || starting_after.is_none() {
                break;
            }
        }

        tracing::debug!(
            customer = %customer_id,
            count = intents.len(),
            "Listed Stripe setup intents"
        );

        Ok(intents)
    }
}
