//! MercadoPago Checkout Pro: preference creation and merchant-order IPN.
//!
//! Checkouts are not signed locally; MercadoPago issues the checkout link when
//! a preference is created. Notifications only name a merchant order, so the
//! payment status needs a follow-up lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CURRENCY, DEFAULT_FRONTEND_URL, DEFAULT_MERCADOPAGO_NOTIFICATION_URL, MERCADOPAGO_API_URL,
    MERCHANT_ORDER_TOPIC,
};
use crate::error::RelayError;
use crate::notification::Notification;
use crate::provider::{Checkout, PaymentProvider, Resolution, StatusChange};
use crate::reference::purchase_id_from_reference;
use crate::request::{PurchaseRequest, BASE_REQUIRED_FIELDS};
use crate::status::StatusUpdate;

/// Where the browser lands after checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

impl BackUrls {
    /// `<frontend>/success`, `<frontend>/failure` and `<frontend>/pending`.
    pub fn under(frontend_url: &str) -> Self {
        let base = frontend_url.trim_end_matches('/');
        Self {
            success: format!("{base}/success"),
            failure: format!("{base}/failure"),
            pending: format!("{base}/pending"),
        }
    }
}

#[derive(Clone)]
pub struct MercadoPagoConfig {
    pub access_token: String,
    /// Return `sandbox_init_point` instead of `init_point`.
    pub test_mode: bool,
    pub api_url: String,
    pub back_urls: BackUrls,
    pub notification_url: String,
}

impl std::fmt::Debug for MercadoPagoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoPagoConfig")
            .field("access_token", &"[REDACTED]")
            .field("test_mode", &self.test_mode)
            .field("api_url", &self.api_url)
            .field("back_urls", &self.back_urls)
            .field("notification_url", &self.notification_url)
            .finish()
    }
}

impl MercadoPagoConfig {
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            test_mode: false,
            api_url: MERCADOPAGO_API_URL.to_string(),
            back_urls: BackUrls::under(DEFAULT_FRONTEND_URL),
            notification_url: DEFAULT_MERCADOPAGO_NOTIFICATION_URL.to_string(),
        }
    }
}

/// Body of `POST /checkout/preferences`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub payer: PreferencePayer,
    pub back_urls: BackUrls,
    pub auto_return: String,
    pub notification_url: String,
    pub external_reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub currency_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferencePayer {
    pub email: String,
}

/// The parts of a created preference the relay reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Preference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub init_point: Option<String>,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MerchantOrder {
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payments: Vec<MerchantOrderPayment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MerchantOrderPayment {
    #[serde(default)]
    pub status: Option<String>,
}

/// MercadoPago REST operations used by the relay.
#[async_trait]
pub trait MercadoPagoApi: Send + Sync {
    async fn create_preference(
        &self,
        preference: &PreferenceRequest,
    ) -> Result<Preference, RelayError>;

    async fn merchant_order(&self, order_id: &str) -> Result<MerchantOrder, RelayError>;
}

/// [`MercadoPagoApi`] over HTTPS with a bearer access token.
pub struct HttpMercadoPagoApi {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
}

impl HttpMercadoPagoApi {
    pub fn new(client: reqwest::Client, config: &MercadoPagoConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<T, RelayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::ProviderCall(format!(
                "{operation} returned {status}: {body}"
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| RelayError::ProviderCall(format!("{operation} response parse failed: {e}")))
    }
}

#[async_trait]
impl MercadoPagoApi for HttpMercadoPagoApi {
    async fn create_preference(
        &self,
        preference: &PreferenceRequest,
    ) -> Result<Preference, RelayError> {
        let url = format!("{}/checkout/preferences", self.api_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(preference)
            .send()
            .await
            .map_err(|e| RelayError::ProviderCall(format!("preference request failed: {e}")))?;
        Self::read_json(response, "preference creation").await
    }

    async fn merchant_order(&self, order_id: &str) -> Result<MerchantOrder, RelayError> {
        let url = format!(
            "{}/merchant_orders/{}",
            self.api_url,
            urlencoding::encode(order_id)
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| RelayError::ProviderCall(format!("merchant order request failed: {e}")))?;
        Self::read_json(response, "merchant order lookup").await
    }
}

/// Order id from a notification resource: the last path segment of
/// `https://api.mercadopago.com/merchant_orders/123`, or the value itself.
pub fn order_id_from_resource(resource: &str) -> Option<&str> {
    resource
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
}

pub struct MercadoPagoProvider<A = HttpMercadoPagoApi> {
    config: MercadoPagoConfig,
    api: A,
}

impl<A: MercadoPagoApi> MercadoPagoProvider<A> {
    pub fn new(config: MercadoPagoConfig, api: A) -> Self {
        Self { config, api }
    }

    pub fn config(&self) -> &MercadoPagoConfig {
        &self.config
    }

    /// Preference for a single line item priced at the purchase total.
    pub fn preference_for(&self, request: &PurchaseRequest) -> Result<PreferenceRequest, RelayError> {
        let unit_price = request.total_amount().ok_or_else(|| {
            RelayError::ProviderCall(format!("total {:?} is not a number", request.total))
        })?;

        Ok(PreferenceRequest {
            items: vec![PreferenceItem {
                title: request
                    .description
                    .clone()
                    .unwrap_or_else(|| request.reference_code.clone()),
                unit_price,
                quantity: 1,
                currency_id: CURRENCY.to_string(),
            }],
            payer: PreferencePayer {
                email: request.buyer_email.clone(),
            },
            back_urls: self.config.back_urls.clone(),
            auto_return: "approved".to_string(),
            notification_url: self.config.notification_url.clone(),
            external_reference: request.reference_code.clone(),
        })
    }
}

#[async_trait]
impl<A: MercadoPagoApi> PaymentProvider for MercadoPagoProvider<A> {
    fn name(&self) -> &'static str {
        "mercadopago"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        BASE_REQUIRED_FIELDS
    }

    async fn build_checkout(&self, request: &PurchaseRequest) -> Result<Checkout, RelayError> {
        let preference = self.preference_for(request)?;
        tracing::info!(
            reference = %request.reference_code,
            preference = ?preference,
            "MercadoPago preference parameters"
        );

        let created = self.api.create_preference(&preference).await?;
        let link = if self.config.test_mode {
            created.sandbox_init_point
        } else {
            created.init_point
        };
        let payment_url = link.ok_or_else(|| {
            RelayError::ProviderCall("preference response has no checkout link".to_string())
        })?;

        tracing::info!(preference_id = ?created.id, "MercadoPago preference created");
        Ok(Checkout {
            payment_url,
            params: Default::default(),
        })
    }

    async fn resolve_notification(
        &self,
        notification: &Notification,
    ) -> Result<Resolution, RelayError> {
        let topic = notification.text("topic").unwrap_or_default();
        if topic != MERCHANT_ORDER_TOPIC {
            tracing::debug!(topic = %topic, "MercadoPago notification ignored");
            return Ok(Resolution::Ignore("not a merchant order"));
        }

        let resource = notification
            .text("resource")
            .or_else(|| notification.text("id"))
            .unwrap_or_default();
        let Some(order_id) = order_id_from_resource(&resource) else {
            tracing::info!("MercadoPago merchant order notification without resource");
            return Ok(Resolution::Ignore("missing resource"));
        };

        let order = self.api.merchant_order(order_id).await?;

        let Some(purchase_id) = order
            .external_reference
            .as_deref()
            .and_then(purchase_id_from_reference)
        else {
            tracing::info!(order_id = %order_id, "merchant order has no external reference");
            return Ok(Resolution::Ignore("missing external reference"));
        };

        let Some(payment) = order.payments.first() else {
            tracing::info!(order_id = %order_id, "merchant order has no payments yet");
            return Ok(Resolution::Ignore("no payments"));
        };

        let status = StatusUpdate::from_mercadopago(payment.status.as_deref().unwrap_or("unknown"));
        tracing::info!(
            order_id = %order_id,
            purchase_id = %purchase_id,
            status = %status,
            "MercadoPago merchant order received"
        );

        Ok(Resolution::Apply(StatusChange {
            purchase_id,
            status,
        }))
    }
}
