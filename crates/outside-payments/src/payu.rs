//! PayU WebCheckout: signed form-post checkouts and confirmation pages.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::constants::{
    CURRENCY, DEFAULT_PAYU_CONFIRMATION_URL, DEFAULT_PAYU_RESPONSE_URL, PAYU_PRODUCTION_URL,
    PAYU_SANDBOX_URL,
};
use crate::error::{RelayError, ValidationError};
use crate::notification::Notification;
use crate::provider::{Checkout, PaymentProvider, Resolution, StatusChange};
use crate::reference::purchase_id_from_reference;
use crate::request::{PurchaseRequest, BASE_REQUIRED_FIELDS, IDENTITY_REQUIRED_FIELDS};
use crate::signature::{confirmation_signature, payment_signature, verify_confirmation_signature};
use crate::status::InternalStatus;

/// Which WebCheckout form to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayuCheckout {
    /// Amount, reference and buyer email only.
    #[default]
    Minimal,
    /// Also sends the full buyer and payer identity. Every identity field is
    /// required.
    Extended,
}

/// PayU merchant configuration.
#[derive(Clone)]
pub struct PayuConfig {
    pub merchant_id: String,
    pub api_key: String,
    pub account_id: String,
    /// Selects the sandbox gateway and sends `test=1`.
    pub test_mode: bool,
    pub checkout: PayuCheckout,
    /// Browser return page after checkout.
    pub response_url: String,
    /// Server-to-server confirmation endpoint.
    pub confirmation_url: String,
    /// Drop confirmations whose `sign` does not match.
    pub verify_confirmation_signature: bool,
}

impl std::fmt::Debug for PayuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayuConfig")
            .field("merchant_id", &self.merchant_id)
            .field("api_key", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .field("test_mode", &self.test_mode)
            .field("checkout", &self.checkout)
            .field("response_url", &self.response_url)
            .field("confirmation_url", &self.confirmation_url)
            .field(
                "verify_confirmation_signature",
                &self.verify_confirmation_signature,
            )
            .finish()
    }
}

impl PayuConfig {
    /// Production, minimal-checkout configuration with the default callback URLs.
    pub fn new(merchant_id: &str, api_key: &str, account_id: &str) -> Self {
        Self {
            merchant_id: merchant_id.to_string(),
            api_key: api_key.to_string(),
            account_id: account_id.to_string(),
            test_mode: false,
            checkout: PayuCheckout::Minimal,
            response_url: DEFAULT_PAYU_RESPONSE_URL.to_string(),
            confirmation_url: DEFAULT_PAYU_CONFIRMATION_URL.to_string(),
            verify_confirmation_signature: false,
        }
    }

    pub fn payment_url(&self) -> &'static str {
        if self.test_mode {
            PAYU_SANDBOX_URL
        } else {
            PAYU_PRODUCTION_URL
        }
    }
}

pub struct PayuProvider {
    config: PayuConfig,
}

impl PayuProvider {
    pub fn new(config: PayuConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PayuConfig {
        &self.config
    }

    /// Signature for a checkout of `amount` under `reference_code`.
    pub fn sign(&self, reference_code: &str, amount: &str) -> String {
        payment_signature(
            &self.config.api_key,
            &self.config.merchant_id,
            reference_code,
            amount,
            CURRENCY,
        )
    }

    fn form_params(&self, request: &PurchaseRequest) -> Result<Map<String, Value>, RelayError> {
        let signature = self.sign(&request.reference_code, &request.total);
        let mut params = Map::new();
        let mut put = |key: &str, value: &str| {
            params.insert(key.to_string(), Value::String(value.to_string()));
        };

        put("merchantId", &self.config.merchant_id);
        put("accountId", &self.config.account_id);
        if let Some(description) = &request.description {
            put("description", description);
        }
        put("referenceCode", &request.reference_code);
        put("amount", &request.total);
        put("tax", "0");
        put("taxReturnBase", "0");
        put("currency", CURRENCY);
        put("signature", &signature);
        put("test", if self.config.test_mode { "1" } else { "0" });
        put("buyerEmail", &request.buyer_email);
        put("responseUrl", &self.config.response_url);
        put("confirmationUrl", &self.config.confirmation_url);

        if self.config.checkout == PayuCheckout::Extended {
            let (buyer, payer) = match (&request.buyer, &request.payer) {
                (Some(buyer), Some(payer)) => (buyer, payer),
                (buyer, payer) => {
                    let mut missing = Vec::new();
                    if buyer.is_none() {
                        missing.extend(&IDENTITY_REQUIRED_FIELDS[3..8]);
                    }
                    if payer.is_none() {
                        missing.extend(&IDENTITY_REQUIRED_FIELDS[8..]);
                    }
                    return Err(ValidationError { missing }.into());
                }
            };
            put("buyerFullName", &buyer.full_name);
            put("telephone", &buyer.phone);
            put("buyerDocumentType", &buyer.document_type);
            put("buyerDocument", &buyer.document);
            put("payerFullName", &payer.full_name);
            put("payerEmail", &payer.email);
            put("payerPhone", &payer.phone);
            put("payerDocumentType", &payer.document_type);
            put("payerDocument", &payer.document);
        }

        Ok(params)
    }

    /// Check the `sign` field of a confirmation against our own computation.
    fn confirmation_is_authentic(&self, notification: &Notification, reference_sale: &str) -> bool {
        let (Some(sign), Some(value), Some(currency), Some(state_pol)) = (
            notification.text("sign"),
            notification.text("value"),
            notification.text("currency"),
            notification.text("state_pol"),
        ) else {
            return false;
        };
        let merchant_id = notification
            .text("merchant_id")
            .unwrap_or_else(|| self.config.merchant_id.clone());

        let expected = confirmation_signature(
            &self.config.api_key,
            &merchant_id,
            reference_sale,
            &value,
            &currency,
            &state_pol,
        );
        verify_confirmation_signature(&expected, &sign)
    }
}

#[async_trait]
impl PaymentProvider for PayuProvider {
    fn name(&self) -> &'static str {
        "payu"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        match self.config.checkout {
            PayuCheckout::Minimal => BASE_REQUIRED_FIELDS,
            PayuCheckout::Extended => IDENTITY_REQUIRED_FIELDS,
        }
    }

    async fn build_checkout(&self, request: &PurchaseRequest) -> Result<Checkout, RelayError> {
        let params = self.form_params(request)?;
        tracing::info!(
            reference = %request.reference_code,
            params = ?params,
            "PayU checkout parameters"
        );
        Ok(Checkout {
            payment_url: self.config.payment_url().to_string(),
            params,
        })
    }

    async fn resolve_notification(
        &self,
        notification: &Notification,
    ) -> Result<Resolution, RelayError> {
        let Some(reference_sale) = notification.text("reference_sale") else {
            tracing::info!("PayU confirmation without reference_sale");
            return Ok(Resolution::Ignore("missing reference_sale"));
        };

        let Some(purchase_id) = purchase_id_from_reference(&reference_sale) else {
            tracing::info!(reference = %reference_sale, "PayU confirmation with empty purchase id");
            return Ok(Resolution::Ignore("empty purchase id"));
        };

        if self.config.verify_confirmation_signature
            && !self.confirmation_is_authentic(notification, &reference_sale)
        {
            tracing::warn!(
                reference = %reference_sale,
                "PayU confirmation signature mismatch, ignoring"
            );
            return Ok(Resolution::Ignore("signature mismatch"));
        }

        let state_pol = notification.text("state_pol").unwrap_or_default();
        let transaction_id = notification.text("transaction_id").unwrap_or_default();
        let status = InternalStatus::from_payu_state(&state_pol);
        tracing::info!(
            reference = %reference_sale,
            state_pol = %state_pol,
            transaction_id = %transaction_id,
            status = %status,
            "PayU confirmation received"
        );

        Ok(Resolution::Apply(StatusChange {
            purchase_id,
            status: status.into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusUpdate;
    use serde_json::json;

    fn config() -> PayuConfig {
        PayuConfig::new("508029", "secretKey", "512321")
    }

    fn request(body: Value, provider: &PayuProvider) -> PurchaseRequest {
        PurchaseRequest::from_json(&body, provider.required_fields()).unwrap()
    }

    #[tokio::test]
    async fn test_minimal_checkout_params() {
        let provider = PayuProvider::new(config());
        let req = request(
            json!({ "total": "10000", "referenceCode": "OUTSIDE_42", "buyerEmail": "a@b.com", "description": "x" }),
            &provider,
        );
        let checkout = provider.build_checkout(&req).await.unwrap();

        assert_eq!(checkout.payment_url, PAYU_PRODUCTION_URL);
        let p = &checkout.params;
        assert_eq!(p["merchantId"], "508029");
        assert_eq!(p["accountId"], "512321");
        assert_eq!(p["description"], "x");
        assert_eq!(p["referenceCode"], "OUTSIDE_42");
        assert_eq!(p["amount"], "10000");
        assert_eq!(p["tax"], "0");
        assert_eq!(p["taxReturnBase"], "0");
        assert_eq!(p["currency"], "COP");
        assert_eq!(p["signature"], "ca774d73fe5ebc83110daec5d575e8c6");
        assert_eq!(p["test"], "0");
        assert_eq!(p["buyerEmail"], "a@b.com");
        assert_eq!(p["responseUrl"], DEFAULT_PAYU_RESPONSE_URL);
        assert_eq!(p["confirmationUrl"], DEFAULT_PAYU_CONFIRMATION_URL);
        assert!(p.get("payerFullName").is_none());
    }

    #[tokio::test]
    async fn test_test_mode_uses_sandbox() {
        let mut cfg = config();
        cfg.test_mode = true;
        let provider = PayuProvider::new(cfg);
        let req = request(
            json!({ "total": "10000", "referenceCode": "OUTSIDE_42", "buyerEmail": "a@b.com" }),
            &provider,
        );
        let checkout = provider.build_checkout(&req).await.unwrap();
        assert_eq!(checkout.payment_url, PAYU_SANDBOX_URL);
        assert_eq!(checkout.params["test"], "1");
        assert!(checkout.params.get("description").is_none());
    }

    #[tokio::test]
    async fn test_extended_checkout_sends_identity() {
        let mut cfg = config();
        cfg.checkout = PayuCheckout::Extended;
        let provider = PayuProvider::new(cfg);
        assert_eq!(provider.required_fields().len(), 13);

        let req = request(
            json!({
                "total": "25000",
                "referenceCode": "OUTSIDE_7",
                "description": "Tickets",
                "buyerFullName": "Ana Gomez",
                "buyerEmail": "ana@b.com",
                "buyerPhone": "3001234567",
                "buyerDocumentType": "CC",
                "buyerDocument": "123",
                "payerFullName": "Luis Gomez",
                "payerEmail": "luis@b.com",
                "payerPhone": "3007654321",
                "payerDocumentType": "CE",
                "payerDocument": "456",
            }),
            &provider,
        );
        let checkout = provider.build_checkout(&req).await.unwrap();
        let p = &checkout.params;
        assert_eq!(p["buyerFullName"], "Ana Gomez");
        assert_eq!(p["telephone"], "3001234567");
        assert_eq!(p["buyerDocumentType"], "CC");
        assert_eq!(p["buyerDocument"], "123");
        assert_eq!(p["payerFullName"], "Luis Gomez");
        assert_eq!(p["payerEmail"], "luis@b.com");
        assert_eq!(p["payerPhone"], "3007654321");
        assert_eq!(p["payerDocumentType"], "CE");
        assert_eq!(p["payerDocument"], "456");
        assert_eq!(p["signature"], provider.sign("OUTSIDE_7", "25000"));
    }

    #[tokio::test]
    async fn test_confirmation_maps_state() {
        let provider = PayuProvider::new(config());
        for (code, expected) in [
            ("4", InternalStatus::Completed),
            ("5", InternalStatus::Expired),
            ("6", InternalStatus::Declined),
            ("7", InternalStatus::Pending),
            ("104", InternalStatus::Unknown),
        ] {
            let n = Notification::from_json(
                json!({ "reference_sale": "OUTSIDE_42", "state_pol": code }).to_string().as_bytes(),
            )
            .unwrap();
            let resolution = provider.resolve_notification(&n).await.unwrap();
            assert_eq!(
                resolution,
                Resolution::Apply(StatusChange {
                    purchase_id: "42".to_string(),
                    status: StatusUpdate::Internal(expected),
                })
            );
        }
    }

    #[tokio::test]
    async fn test_confirmation_numeric_and_absent_state() {
        let provider = PayuProvider::new(config());

        let n = Notification::from_json(br#"{"reference_sale":"OUTSIDE_42","state_pol":4}"#).unwrap();
        let Resolution::Apply(change) = provider.resolve_notification(&n).await.unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(change.status, StatusUpdate::Internal(InternalStatus::Completed));

        let n = Notification::from_json(br#"{"reference_sale":"OUTSIDE_42"}"#).unwrap();
        let Resolution::Apply(change) = provider.resolve_notification(&n).await.unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(change.status, StatusUpdate::Internal(InternalStatus::Unknown));
    }

    #[tokio::test]
    async fn test_confirmation_without_reference_is_ignored() {
        let provider = PayuProvider::new(config());
        let n = Notification::from_json(br#"{"state_pol":"4"}"#).unwrap();
        assert!(matches!(
            provider.resolve_notification(&n).await.unwrap(),
            Resolution::Ignore(_)
        ));

        let n = Notification::from_json(br#"{"reference_sale":"OUTSIDE_","state_pol":"4"}"#).unwrap();
        assert!(matches!(
            provider.resolve_notification(&n).await.unwrap(),
            Resolution::Ignore(_)
        ));
    }

    #[tokio::test]
    async fn test_signature_verification_when_enabled() {
        let mut cfg = config();
        cfg.verify_confirmation_signature = true;
        let provider = PayuProvider::new(cfg);

        let signed = Notification::from_form(
            b"merchant_id=508029&reference_sale=OUTSIDE_42&value=150.00&currency=COP&state_pol=4&sign=cc9f63362488c3797d95fb6904eb6404",
        );
        assert!(matches!(
            provider.resolve_notification(&signed).await.unwrap(),
            Resolution::Apply(_)
        ));

        let tampered = Notification::from_form(
            b"merchant_id=508029&reference_sale=OUTSIDE_42&value=150.00&currency=COP&state_pol=6&sign=cc9f63362488c3797d95fb6904eb6404",
        );
        assert_eq!(
            provider.resolve_notification(&tampered).await.unwrap(),
            Resolution::Ignore("signature mismatch")
        );

        let unsigned = Notification::from_form(b"reference_sale=OUTSIDE_42&state_pol=4");
        assert_eq!(
            provider.resolve_notification(&unsigned).await.unwrap(),
            Resolution::Ignore("signature mismatch")
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", config());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("secretKey"));
    }
}
