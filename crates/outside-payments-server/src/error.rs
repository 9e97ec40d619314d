use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use outside_payments::RelayError;

/// Errors returned by the checkout routes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The provider behind this route has no credentials configured
    #[error("provider not configured")]
    NotConfigured,

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotConfigured => StatusCode::NOT_FOUND,
            ApiError::Relay(RelayError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::NotConfigured => HttpResponse::NotFound().json(serde_json::json!({
                "error": "provider not configured"
            })),
            ApiError::Relay(RelayError::Validation(e)) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": e.to_string(),
                    "missingFields": e.missing,
                }))
            }
            ApiError::Relay(e) => {
                tracing::error!("Checkout failed: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "failed to create payment"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use outside_payments::ValidationError;

    async fn body_json(err: ApiError) -> serde_json::Value {
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[actix_rt::test]
    async fn test_validation_lists_missing_fields() {
        let err = ApiError::from(RelayError::from(ValidationError {
            missing: vec!["total", "buyerEmail"],
        }));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = body_json(err).await;
        assert_eq!(body["missingFields"], serde_json::json!(["total", "buyerEmail"]));
        assert_eq!(body["error"], "missing required fields: total, buyerEmail");
    }

    #[actix_rt::test]
    async fn test_provider_failure_is_generic() {
        let err = ApiError::from(RelayError::ProviderCall(
            "401 Unauthorized: invalid access token".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(err).await;
        assert_eq!(body["error"], "failed to create payment");
        assert!(!body.to_string().contains("access token"));
    }

    #[actix_rt::test]
    async fn test_not_configured_is_404() {
        let err = ApiError::NotConfigured;
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(err).await["error"], "provider not configured");
    }
}
