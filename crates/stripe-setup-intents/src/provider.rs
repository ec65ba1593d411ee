//! Sources of a shared [`StripeClient`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::client::StripeClient;
use crate::config::StripeConfig;
use crate::error::Result;
use crate::singleton::AsyncSingleton;

/// Hands out the process-wide Stripe client.
#[async_trait]
pub trait StripeClientProvider: Send + Sync {
    /// Get the client, building it on first use.
    async fn get(&self) -> Result<Arc<StripeClient>>;
}

/// Builds one client from a configuration on first use.
#[derive(Debug)]
pub struct ConfigClientProvider {
    client: AsyncSingleton<StripeClient>,
}

impl ConfigClientProvider {
    /// Create a provider for the given configuration.
    #[must_use]
    pub fn new(config: StripeConfig) -> Self {
        let client = AsyncSingleton::new(move || {
            let config = config.clone();
            async move {
                tracing::debug!(config = ?config, "Building Stripe client");
                StripeClient::new(&config)
            }
        });

        Self { client }
    }

    /// Create a provider from secrets file or environment configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no Stripe API key is configured.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(StripeConfig::from_env()?))
    }
}

#[async_trait]
impl StripeClientProvider for ConfigClientProvider {
    async fn get(&self) -> Result<Arc<StripeClient>> {
        self.client.get().await
    }
}

/// Hands out a client that was built up front.
#[derive(Debug, Clone)]
pub struct StaticClientProvider {
    client: Arc<StripeClient>,
}

impl StaticClientProvider {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: StripeClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl StripeClientProvider for StaticClientProvider {
    async fn get(&self) -> Result<Arc<StripeClient>> {
        Ok(Arc::clone(&self.client))
    }
}
