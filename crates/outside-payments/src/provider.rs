//! Provider strategy trait.
//!
//! A provider knows which fields a checkout needs, how to turn a validated
//! purchase into a hosted-checkout redirect, and how to read its own
//! notifications. See [`crate::payu::PayuProvider`] and
//! [`crate::mercadopago::MercadoPagoProvider`].

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::RelayError;
use crate::notification::Notification;
use crate::request::PurchaseRequest;
use crate::status::StatusUpdate;

/// Redirect payload handed back to the storefront.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    /// Hosted checkout page (sandbox or production).
    pub payment_url: String,
    /// Form fields to post to `payment_url`. Empty for redirect-only providers.
    pub params: Map<String, Value>,
}

/// Status change extracted from a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub purchase_id: String,
    pub status: StatusUpdate,
}

/// What a provider made of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Apply the change to the purchase record.
    Apply(StatusChange),
    /// Acknowledge without touching the store.
    Ignore(&'static str),
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Short provider name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Fields a purchase payload must carry, in reporting order.
    fn required_fields(&self) -> &'static [&'static str];

    /// Build the checkout redirect for a validated purchase.
    async fn build_checkout(&self, request: &PurchaseRequest) -> Result<Checkout, RelayError>;

    /// Read a notification. Anything the provider cannot correlate with a
    /// purchase resolves to [`Resolution::Ignore`], not an error.
    async fn resolve_notification(
        &self,
        notification: &Notification,
    ) -> Result<Resolution, RelayError>;
}
