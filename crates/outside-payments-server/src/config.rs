use outside_payments::mercadopago::BackUrls;
use outside_payments::{
    MercadoPagoConfig, PayuCheckout, PayuConfig, DEFAULT_FRONTEND_URL,
    DEFAULT_MERCADOPAGO_NOTIFICATION_URL, DEFAULT_PAYU_CONFIRMATION_URL,
    DEFAULT_PAYU_RESPONSE_URL, MERCADOPAGO_API_URL,
};
use std::env;
use url::Url;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_RATE_LIMIT_RPM: u32 = 120;
const DEFAULT_PURCHASES_TABLE: &str = "purchases";

/// Where purchase status updates go.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Supabase REST table.
    Supabase {
        url: String,
        key: String,
        table: String,
    },
    /// Process memory; for local development only.
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Supabase { url, table, .. } => f
                .debug_struct("Supabase")
                .field("url", url)
                .field("key", &"[REDACTED]")
                .field("table", table)
                .finish(),
            StoreConfig::Memory => f.write_str("Memory"),
        }
    }
}

/// Process-wide configuration, read once at startup.
#[derive(Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute per IP
    pub rate_limit_rpm: u32,
    /// Bearer token required for /metrics (None = public)
    pub metrics_token: Option<String>,
    /// PayU merchant settings (None = PayU routes disabled)
    pub payu: Option<PayuConfig>,
    /// MercadoPago settings (None = MercadoPago routes disabled)
    pub mercadopago: Option<MercadoPagoConfig>,
    pub store: StoreConfig,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("payu", &self.payu)
            .field("mercadopago", &self.mercadopago)
            .field("store", &self.store)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let flag = |name: &str| {
            var(name)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false)
        };
        let url_var = |name: &'static str, default: &str| -> Result<String, ConfigError> {
            let value = var(name).unwrap_or_else(|| default.to_string());
            Url::parse(&value).map_err(|_| ConfigError::InvalidUrl(name, value.clone()))?;
            Ok(value)
        };

        // Optional: port
        let port = match var("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("PORT", p))?,
            None => DEFAULT_PORT,
        };

        // Optional: rate limit
        let rate_limit_rpm = match var("RATE_LIMIT_RPM") {
            Some(r) => r
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("RATE_LIMIT_RPM", r))?,
            None => DEFAULT_RATE_LIMIT_RPM,
        };

        // Optional: allowed origins
        let allowed_origins: Vec<String> = var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });
        if allowed_origins.iter().any(|o| o == "*") {
            return Err(ConfigError::WildcardOrigin);
        }

        let metrics_token = var("METRICS_TOKEN");

        // PayU: all three credentials or none
        let payu_vars = [
            ("PAYU_MERCHANT_ID", var("PAYU_MERCHANT_ID")),
            ("PAYU_API_KEY", var("PAYU_API_KEY")),
            ("PAYU_ACCOUNT_ID", var("PAYU_ACCOUNT_ID")),
        ];
        let payu = match payu_vars {
            [(_, Some(merchant_id)), (_, Some(api_key)), (_, Some(account_id))] => {
                let mut payu = PayuConfig::new(&merchant_id, &api_key, &account_id);
                payu.test_mode = flag("PAYU_TEST_MODE");
                payu.checkout = if flag("PAYU_EXTENDED_CHECKOUT") {
                    PayuCheckout::Extended
                } else {
                    PayuCheckout::Minimal
                };
                payu.response_url = url_var("PAYU_RESPONSE_URL", DEFAULT_PAYU_RESPONSE_URL)?;
                payu.confirmation_url =
                    url_var("PAYU_CONFIRMATION_URL", DEFAULT_PAYU_CONFIRMATION_URL)?;
                payu.verify_confirmation_signature = flag("PAYU_VERIFY_SIGNATURE");
                Some(payu)
            }
            [(_, None), (_, None), (_, None)] => None,
            vars => {
                let missing = vars
                    .iter()
                    .find(|(_, value)| value.is_none())
                    .map(|(name, _)| *name)
                    .unwrap_or("PAYU_MERCHANT_ID");
                return Err(ConfigError::MissingRequired(missing));
            }
        };

        // MercadoPago: enabled by its access token
        let mercadopago = match var("MERCADOPAGO_ACCESS_TOKEN") {
            Some(token) => {
                let mut mp = MercadoPagoConfig::new(&token);
                mp.test_mode = flag("MERCADOPAGO_TEST_MODE");
                mp.api_url = url_var("MERCADOPAGO_API_URL", MERCADOPAGO_API_URL)?;
                mp.back_urls = BackUrls::under(&url_var("FRONTEND_URL", DEFAULT_FRONTEND_URL)?);
                mp.notification_url = url_var(
                    "MERCADOPAGO_NOTIFICATION_URL",
                    DEFAULT_MERCADOPAGO_NOTIFICATION_URL,
                )?;
                Some(mp)
            }
            None => None,
        };

        if payu.is_none() && mercadopago.is_none() {
            return Err(ConfigError::NoProvider);
        }

        let store = match var("STORE_BACKEND").as_deref() {
            Some("memory") => {
                tracing::warn!(
                    "STORE_BACKEND=memory: purchase statuses are kept in process memory only"
                );
                StoreConfig::Memory
            }
            Some("supabase") | None => {
                let url = var("SUPABASE_URL").ok_or(ConfigError::MissingRequired("SUPABASE_URL"))?;
                Url::parse(&url).map_err(|_| ConfigError::InvalidUrl("SUPABASE_URL", url.clone()))?;
                let key = var("SUPABASE_KEY").ok_or(ConfigError::MissingRequired("SUPABASE_KEY"))?;
                let table = var("PURCHASES_TABLE")
                    .unwrap_or_else(|| DEFAULT_PURCHASES_TABLE.to_string());
                StoreConfig::Supabase { url, key, table }
            }
            Some(other) => return Err(ConfigError::UnknownStore(other.to_string())),
        };

        Ok(Self {
            port,
            allowed_origins,
            rate_limit_rpm,
            metrics_token,
            payu,
            mercadopago,
            store,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL in {0}: {1}")]
    InvalidUrl(&'static str, String),

    #[error("invalid number in {0}: {1}")]
    InvalidNumber(&'static str, String),

    #[error("no payment provider configured: set the PAYU_* credentials or MERCADOPAGO_ACCESS_TOKEN")]
    NoProvider,

    #[error("wildcard CORS origin '*' is not allowed for payment endpoints")]
    WildcardOrigin,

    #[error("unknown STORE_BACKEND: {0} (expected supabase or memory)")]
    UnknownStore(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    const PAYU_AND_SUPABASE: &[(&str, &str)] = &[
        ("PAYU_MERCHANT_ID", "508029"),
        ("PAYU_API_KEY", "secretKey"),
        ("PAYU_ACCOUNT_ID", "512321"),
        ("SUPABASE_URL", "https://abc.supabase.co"),
        ("SUPABASE_KEY", "service-key"),
    ];

    #[test]
    fn test_payu_with_defaults() {
        let config = ServerConfig::from_lookup(lookup(PAYU_AND_SUPABASE)).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.rate_limit_rpm, 120);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
        let payu = config.payu.unwrap();
        assert_eq!(payu.merchant_id, "508029");
        assert!(!payu.test_mode);
        assert_eq!(payu.checkout, PayuCheckout::Minimal);
        assert_eq!(payu.response_url, "http://localhost:5173/success");
        assert_eq!(payu.confirmation_url, "http://localhost:4000/confirmation");
        assert!(config.mercadopago.is_none());
        assert_eq!(
            config.store,
            StoreConfig::Supabase {
                url: "https://abc.supabase.co".to_string(),
                key: "service-key".to_string(),
                table: "purchases".to_string(),
            }
        );
    }

    #[test]
    fn test_flags_and_overrides() {
        let mut vars = PAYU_AND_SUPABASE.to_vec();
        vars.extend([
            ("PAYU_TEST_MODE", "true"),
            ("PAYU_EXTENDED_CHECKOUT", "1"),
            ("PAYU_VERIFY_SIGNATURE", "true"),
            ("PAYU_CONFIRMATION_URL", "https://api.outside.co/confirmation"),
            ("MERCADOPAGO_ACCESS_TOKEN", "TEST-123"),
            ("MERCADOPAGO_TEST_MODE", "true"),
            ("FRONTEND_URL", "https://outside.co/"),
            ("ALLOWED_ORIGINS", "https://outside.co, https://www.outside.co"),
            ("PORT", "8080"),
        ]);
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.allowed_origins,
            vec!["https://outside.co", "https://www.outside.co"]
        );

        let payu = config.payu.unwrap();
        assert!(payu.test_mode);
        assert_eq!(payu.checkout, PayuCheckout::Extended);
        assert!(payu.verify_confirmation_signature);
        assert_eq!(payu.confirmation_url, "https://api.outside.co/confirmation");

        let mp = config.mercadopago.unwrap();
        assert!(mp.test_mode);
        assert_eq!(mp.back_urls.success, "https://outside.co/success");
        assert_eq!(mp.back_urls.pending, "https://outside.co/pending");
    }

    #[test]
    fn test_test_mode_requires_literal_true_or_one() {
        let mut vars = PAYU_AND_SUPABASE.to_vec();
        vars.push(("PAYU_TEST_MODE", "yes"));
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(!config.payu.unwrap().test_mode);
    }

    #[test]
    fn test_partial_payu_credentials_rejected() {
        let vars = [
            ("PAYU_MERCHANT_ID", "508029"),
            ("PAYU_ACCOUNT_ID", "512321"),
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_KEY", "k"),
        ];
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::MissingRequired("PAYU_API_KEY"))
        ));
    }

    #[test]
    fn test_requires_a_provider() {
        let vars = [("SUPABASE_URL", "https://abc.supabase.co"), ("SUPABASE_KEY", "k")];
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::NoProvider)
        ));
    }

    #[test]
    fn test_supabase_required_unless_memory() {
        let vars = [("MERCADOPAGO_ACCESS_TOKEN", "TEST-123")];
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::MissingRequired("SUPABASE_URL"))
        ));

        let vars = [
            ("MERCADOPAGO_ACCESS_TOKEN", "TEST-123"),
            ("STORE_BACKEND", "memory"),
        ];
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.store, StoreConfig::Memory);
    }

    #[test]
    fn test_rejects_wildcard_origin_and_bad_urls() {
        let mut vars = PAYU_AND_SUPABASE.to_vec();
        vars.push(("ALLOWED_ORIGINS", "*"));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::WildcardOrigin)
        ));

        let mut vars = PAYU_AND_SUPABASE.to_vec();
        vars.push(("PAYU_RESPONSE_URL", "not a url"));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidUrl("PAYU_RESPONSE_URL", _))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut vars = PAYU_AND_SUPABASE.to_vec();
        vars.push(("METRICS_TOKEN", "metrics-secret"));
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secretKey"));
        assert!(!rendered.contains("service-key"));
        assert!(!rendered.contains("metrics-secret"));
    }
}
