use std::sync::Arc;

use serde_json::Value;

use crate::error::RelayError;
use crate::provider::{Checkout, PaymentProvider};
use crate::request::PurchaseRequest;

/// Validates purchase payloads and turns them into checkout redirects.
#[derive(Clone)]
pub struct PaymentRequestBuilder {
    provider: Arc<dyn PaymentProvider>,
}

impl PaymentRequestBuilder {
    pub fn new(provider: Arc<dyn PaymentProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Validate `body` and build the provider checkout.
    ///
    /// Missing fields fail with [`RelayError::Validation`] before anything is
    /// signed or sent to the provider.
    pub async fn build(&self, body: &Value) -> Result<Checkout, RelayError> {
        let request = PurchaseRequest::from_json(body, self.provider.required_fields())?;
        self.provider.build_checkout(&request).await
    }
}
