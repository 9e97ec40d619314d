use actix_governor::Governor;
use actix_web::{web, HttpResponse};
use outside_payments::Checkout;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::metrics::{CHECKOUT_LATENCY, CHECKOUT_REQUESTS};
use crate::rate_limit::RateLimit;
use crate::state::{AppState, ProviderRoutes};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayuCheckoutResponse {
    payment_url: String,
    payu_params: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RedirectResponse {
    payment_url: String,
}

/// Purchase payload from a raw request body.
///
/// Only a JSON object is read. An empty, form-encoded or malformed body reads
/// as `{}` and so fails validation with every required field listed.
fn purchase_body(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) | Err(_) => {
            if !body.iter().all(u8::is_ascii_whitespace) {
                tracing::debug!(len = body.len(), "checkout body is not a JSON object");
            }
            Value::Object(Map::new())
        }
    }
}

async fn build_checkout(
    routes: Option<&ProviderRoutes>,
    body: &Value,
) -> Result<Checkout, ApiError> {
    let routes = routes.ok_or(ApiError::NotConfigured)?;
    let provider = routes.builder.provider_name();

    let timer = CHECKOUT_LATENCY
        .with_label_values(&[provider])
        .start_timer();
    let result = routes.builder.build(body).await;
    timer.observe_duration();

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) if e.is_client_error() => "invalid",
        Err(_) => "error",
    };
    CHECKOUT_REQUESTS
        .with_label_values(&[provider, outcome])
        .inc();

    Ok(result?)
}

/// POST /create-payu-payment - Signed PayU form for the storefront to post
pub async fn create_payu_payment(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let checkout = build_checkout(state.payu.as_ref(), &purchase_body(&body)).await?;
    Ok(HttpResponse::Ok().json(PayuCheckoutResponse {
        payment_url: checkout.payment_url,
        payu_params: checkout.params,
    }))
}

/// POST /create-mercadopago-payment - MercadoPago checkout redirect
pub async fn create_mercadopago_payment(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let checkout = build_checkout(state.mercadopago.as_ref(), &purchase_body(&body)).await?;
    Ok(HttpResponse::Ok().json(RedirectResponse {
        payment_url: checkout.payment_url,
    }))
}

/// Mount the checkout routes behind the per-IP limiter.
pub fn configure(cfg: &mut web::ServiceConfig, rate_limit: &RateLimit) {
    cfg.service(
        web::resource("/create-payu-payment")
            .wrap(Governor::new(rate_limit))
            .route(web::post().to(create_payu_payment)),
    )
    .service(
        web::resource("/create-mercadopago-payment")
            .wrap(Governor::new(rate_limit))
            .route(web::post().to(create_mercadopago_payment)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_body_reads_json_objects_only() {
        let body = purchase_body(br#"{"total":"10000","buyerEmail":"a@b.com"}"#);
        assert_eq!(body["total"], "10000");

        let not_objects: [&[u8]; 4] = [
            b"",
            b"total=10000&referenceCode=OUTSIDE_42",
            b"{\"total\":",
            b"[1,2]",
        ];
        for raw in not_objects {
            assert_eq!(purchase_body(raw), Value::Object(Map::new()));
        }
    }
}
