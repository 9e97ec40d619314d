/// Currency every checkout is priced in. Part of the signed payload.
pub const CURRENCY: &str = "COP";

/// Prefix that embeds the purchase id in a reference code (`OUTSIDE_<id>`).
pub const REFERENCE_PREFIX: &str = "OUTSIDE_";

/// Field delimiter of the PayU signature payload.
pub const SIGNATURE_DELIMITER: &str = "~";

/// PayU WebCheckout sandbox gateway.
pub const PAYU_SANDBOX_URL: &str = "https://sandbox.checkout.payulatam.com/ppp-web-gateway";

/// PayU WebCheckout production gateway.
pub const PAYU_PRODUCTION_URL: &str = "https://checkout.payulatam.com/ppp-web-gateway";

/// Default browser return URL after a PayU checkout.
pub const DEFAULT_PAYU_RESPONSE_URL: &str = "http://localhost:5173/success";

/// Default server-to-server PayU confirmation URL.
pub const DEFAULT_PAYU_CONFIRMATION_URL: &str = "http://localhost:4000/confirmation";

/// MercadoPago REST API base.
pub const MERCADOPAGO_API_URL: &str = "https://api.mercadopago.com";

/// Notification topic that carries merchant-order events.
pub const MERCHANT_ORDER_TOPIC: &str = "merchant_order";

/// Default frontend base for MercadoPago back URLs.
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Default MercadoPago notification URL.
pub const DEFAULT_MERCADOPAGO_NOTIFICATION_URL: &str = "http://localhost:4000/webhook";
