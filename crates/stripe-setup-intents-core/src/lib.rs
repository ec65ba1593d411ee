//! Core types for Stripe SetupIntents.
//!
//! This crate holds the plain data types shared by the SetupIntents client:
//!
//! - **Usage**: `SetupIntentUsage` (`on_session` / `off_session`)
//! - **Idempotency**: `IdempotencyKey`
//! - **Resources**: `SetupIntent`, `SetupIntentStatus`, `SetupError`, `StripeList`
//! - **Mandates**: `MandateDataOptions`, `CustomerAcceptance`, `AcceptanceType`
//!
//! Nothing in here performs I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod idempotency;
pub mod mandate;
pub mod setup_intent;
pub mod usage;

pub use error::{CoreError, Result};
pub use idempotency::{IdempotencyKey, MAX_IDEMPOTENCY_KEY_LEN};
pub use mandate::{AcceptanceType, CustomerAcceptance, MandateDataOptions, OnlineAcceptance};
pub use setup_intent::{SetupError, SetupIntent, SetupIntentStatus, StripeList};
pub use usage::SetupIntentUsage;
