use std::sync::Arc;
use std::time::Duration;

use outside_payments::{
    ConfirmationHandler, HttpMercadoPagoApi, InMemoryPurchaseStore, MercadoPagoProvider,
    PaymentProvider, PaymentRequestBuilder, PayuProvider, PurchaseStore, SupabaseStore,
};

use crate::config::{ConfigError, ServerConfig, StoreConfig};

/// Checkout and notification handling for one provider.
#[derive(Clone)]
pub struct ProviderRoutes {
    pub builder: PaymentRequestBuilder,
    pub confirmations: ConfirmationHandler,
}

impl ProviderRoutes {
    pub fn new(provider: Arc<dyn PaymentProvider>, store: Arc<dyn PurchaseStore>) -> Self {
        Self {
            builder: PaymentRequestBuilder::new(provider.clone()),
            confirmations: ConfirmationHandler::new(provider, store),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PayU routes (None when PayU credentials are not set)
    pub payu: Option<ProviderRoutes>,
    /// MercadoPago routes (None when no access token is set)
    pub mercadopago: Option<ProviderRoutes>,
    pub metrics_token: Option<String>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let store: Arc<dyn PurchaseStore> = match &config.store {
            StoreConfig::Supabase { url, key, table } => {
                Arc::new(SupabaseStore::new(http_client.clone(), url, key, table))
            }
            StoreConfig::Memory => Arc::new(InMemoryPurchaseStore::new()),
        };

        let payu = config.payu.clone().map(|payu| {
            ProviderRoutes::new(Arc::new(PayuProvider::new(payu)), store.clone())
        });

        let mercadopago = config.mercadopago.clone().map(|mp| {
            let api = HttpMercadoPagoApi::new(http_client.clone(), &mp);
            ProviderRoutes::new(Arc::new(MercadoPagoProvider::new(mp, api)), store.clone())
        });

        Ok(Self {
            payu,
            mercadopago,
            metrics_token: config.metrics_token.clone(),
        })
    }

    /// Names of the providers with routes mounted.
    pub fn providers(&self) -> Vec<&'static str> {
        [&self.payu, &self.mercadopago]
            .into_iter()
            .flatten()
            .map(|routes| routes.builder.provider_name())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configured_providers_are_mounted() {
        let config = ServerConfig::from_lookup(|name| match name {
            "MERCADOPAGO_ACCESS_TOKEN" => Some("TEST-123".to_string()),
            "STORE_BACKEND" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap();

        let state = AppState::from_config(&config).unwrap();
        assert!(state.payu.is_none());
        assert_eq!(state.providers(), vec!["mercadopago"]);
    }
}
