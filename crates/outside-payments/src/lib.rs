//! Payment request signing and confirmation status mapping.
//!
//! Two components sit on top of a provider strategy:
//!
//! - **Builder** ([`PaymentRequestBuilder`]): validates a purchase payload,
//!   signs it and assembles the hosted-checkout redirect parameters
//! - **Confirmation handler** ([`ConfirmationHandler`]): turns an asynchronous
//!   provider notification into a status update on the purchase record
//!
//! Providers implement [`PaymentProvider`]: [`PayuProvider`] signs form-post
//! checkouts, [`MercadoPagoProvider`] creates preferences through the
//! MercadoPago API. Purchases are updated through the narrow
//! [`PurchaseStore`] contract.
//!
//! # Quick example (PayU)
//!
//! ```no_run
//! use outside_payments::{PaymentRequestBuilder, PayuConfig, PayuProvider};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let payu = PayuProvider::new(PayuConfig::new("508029", "4Vj8eK4rloUd272L48hsrarnUA", "512321"));
//! let builder = PaymentRequestBuilder::new(Arc::new(payu));
//!
//! let body = serde_json::json!({
//!     "total": "10000",
//!     "referenceCode": "OUTSIDE_42",
//!     "buyerEmail": "a@b.com",
//!     "description": "x",
//! });
//! let checkout = builder.build(&body).await.unwrap();
//! println!("{}", checkout.payment_url);
//! # }
//! ```

// Core types and traits
pub mod constants;
pub mod error;
pub mod notification;
pub mod provider;
pub mod reference;
pub mod request;
pub mod signature;
pub mod status;

// Provider strategies
pub mod mercadopago;
pub mod payu;

// Components and persistence
pub mod builder;
pub mod confirmation;
pub mod store;

// Re-exports
pub use builder::PaymentRequestBuilder;
pub use confirmation::{ConfirmationHandler, ConfirmationOutcome};
pub use constants::*;
pub use error::{RelayError, ValidationError};
pub use mercadopago::{HttpMercadoPagoApi, MercadoPagoApi, MercadoPagoConfig, MercadoPagoProvider};
pub use notification::Notification;
pub use payu::{PayuCheckout, PayuConfig, PayuProvider};
pub use provider::{Checkout, PaymentProvider, Resolution, StatusChange};
pub use request::PurchaseRequest;
pub use status::{InternalStatus, StatusUpdate};
pub use store::{InMemoryPurchaseStore, PurchaseStore, StoreError, SupabaseStore};
