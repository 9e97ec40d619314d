use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest, HttpResponse};
use sha2::{Digest, Sha256};

use crate::metrics::metrics_output;
use crate::state::AppState;

/// GET /health - Liveness plus the providers this instance serves
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "outside-payments-server",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": state.providers(),
    }))
}

/// Whether `req` carries `Authorization: Bearer <expected>`.
///
/// Both tokens are reduced to SHA-256 digests first, so the comparison takes
/// the same time whatever their contents or lengths.
fn bearer_matches(req: &HttpRequest, expected: &str) -> bool {
    let Some(presented) = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return false;
    };

    Sha256::digest(presented.as_bytes())
        .iter()
        .zip(Sha256::digest(expected.as_bytes()).iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// GET /metrics - Prometheus scrape target, gated when METRICS_TOKEN is set
pub async fn metrics(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if let Some(expected) = state.metrics_token.as_deref() {
        if !bearer_matches(&req, expected) {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "unauthorized",
                "message": "Bearer token required for /metrics"
            }));
        }
    }

    match metrics_output() {
        Ok(text) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(text),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            HttpResponse::InternalServerError().body("failed to encode metrics")
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_matches_exact_token_only() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer metrics-token"))
            .to_http_request();
        assert!(bearer_matches(&req, "metrics-token"));
        assert!(!bearer_matches(&req, "metrics-tokeN"));
        assert!(!bearer_matches(&req, "a much longer metrics token"));

        let basic = TestRequest::default()
            .insert_header(("Authorization", "Basic metrics-token"))
            .to_http_request();
        assert!(!bearer_matches(&basic, "metrics-token"));

        let missing = TestRequest::default().to_http_request();
        assert!(!bearer_matches(&missing, "metrics-token"));
    }
}
