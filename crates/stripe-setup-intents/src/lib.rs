//! Typed client for Stripe's SetupIntents API.
//!
//! SetupIntents collect and store a customer's payment method (card, bank
//! debit) for later use without charging it, e.g. for recurring off-session
//! billing.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stripe_setup_intents::{
//!     ConfigClientProvider, CreateSetupIntent, IdempotencyKey, SetupIntentUsage,
//!     SetupIntentsApi, StripeConfig, StripeSetupIntents,
//! };
//!
//! # async fn example() -> Result<(), stripe_setup_intents::StripeError> {
//! let provider = ConfigClientProvider::new(StripeConfig::new("sk_test_..."));
//! let setup_intents = StripeSetupIntents::new(Arc::new(provider));
//!
//! // Save a card for future off-session charges
//! let intent = setup_intents
//!     .create_and_confirm_for_off_session_card(
//!         "cus_123",
//!         "pm_card_visa",
//!         None,
//!         Some(IdempotencyKey::new("order-42-card")?),
//!     )
//!     .await?;
//! println!("SetupIntent {} is {:?}", intent.id, intent.status);
//!
//! // Or build the request yourself
//! let intent = setup_intents
//!     .create(CreateSetupIntent::new("cus_123").with_usage(SetupIntentUsage::OnSession))
//!     .await?;
//! println!("Client secret: {:?}", intent.client_secret);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod setup_intents;
pub mod singleton;

pub use client::StripeClient;
pub use config::{StripeConfig, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECONDS};
pub use error::{Result, StripeError};
pub use provider::{ConfigClientProvider, StaticClientProvider, StripeClientProvider};
pub use setup_intents::{
    CreateSetupIntent, SetupIntentService, SetupIntentsApi, StripeSetupIntents, LIST_PAGE_SIZE,
};
pub use singleton::AsyncSingleton;

pub use stripe_setup_intents_core::{
    AcceptanceType, CoreError, CustomerAcceptance, IdempotencyKey, MandateDataOptions,
    OnlineAcceptance, SetupError, SetupIntent, SetupIntentStatus, SetupIntentUsage, StripeList,
};
