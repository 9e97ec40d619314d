use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use outside_payments::{ConfirmationOutcome, Notification, RelayError};

use crate::error::ApiError;
use crate::metrics::{NOTIFICATIONS, STORE_FAILURES};
use crate::state::{AppState, ProviderRoutes};

fn content_type(req: &HttpRequest) -> Option<&str> {
    req.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

/// Apply a decoded notification and answer the provider.
///
/// Anything short of an undecodable body or a failed provider lookup is
/// acknowledged with 200 so the provider stops retrying.
async fn acknowledge(
    routes: &ProviderRoutes,
    notification: Result<Notification, RelayError>,
) -> HttpResponse {
    let handler = &routes.confirmations;
    let provider = handler.provider_name();

    let result = match notification {
        Ok(notification) => handler.handle(&notification).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            let label = match outcome {
                ConfirmationOutcome::Ignored(_) => "ignored",
                ConfirmationOutcome::Updated(_) => "updated",
                ConfirmationOutcome::StoreFailed(_) => {
                    STORE_FAILURES.with_label_values(&[provider]).inc();
                    "store_failed"
                }
            };
            NOTIFICATIONS.with_label_values(&[provider, label]).inc();
            HttpResponse::Ok().content_type("text/plain").body("OK")
        }
        Err(e) => {
            tracing::error!(provider, error = %e, "failed to process notification");
            NOTIFICATIONS.with_label_values(&[provider, "error"]).inc();
            HttpResponse::InternalServerError()
                .content_type("text/plain")
                .body("Error")
        }
    }
}

/// POST /confirmation - PayU confirmation page (form-encoded or JSON)
pub async fn payu_confirmation(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let routes = state.payu.as_ref().ok_or(ApiError::NotConfigured)?;
    let notification = Notification::decode(content_type(&req), &body);
    Ok(acknowledge(routes, notification).await)
}

/// POST /webhook - MercadoPago IPN; `topic` and `id` may arrive in the query
pub async fn mercadopago_webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let routes = state.mercadopago.as_ref().ok_or(ApiError::NotConfigured)?;
    let notification = Notification::decode(content_type(&req), &body)
        .map(|n| n.with_query(req.query_string()));
    Ok(acknowledge(routes, notification).await)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/confirmation", web::post().to(payu_confirmation))
        .route("/webhook", web::post().to(mercadopago_webhook));
}
