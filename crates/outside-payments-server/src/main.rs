use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use outside_server::{
    config::{ServerConfig, StoreConfig},
    cors::build_cors,
    metrics::register_metrics,
    rate_limit::rate_limit,
    routes,
    state::AppState,
};

/// Request bodies are small JSON or form payloads.
const BODY_LIMIT: usize = 64 * 1024;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    let rate_limit_rpm = config.rate_limit_rpm;

    tracing::info!("Starting outside-payments-server on port {}", port);
    if let Some(ref payu) = config.payu {
        tracing::info!(
            merchant_id = %payu.merchant_id,
            test_mode = payu.test_mode,
            checkout = ?payu.checkout,
            verify_signature = payu.verify_confirmation_signature,
            "PayU enabled"
        );
    }
    if let Some(ref mp) = config.mercadopago {
        tracing::info!(test_mode = mp.test_mode, "MercadoPago enabled");
    }
    match config.store {
        StoreConfig::Supabase { ref url, ref table, .. } => {
            tracing::info!("Purchase store: Supabase {} (table {})", url, table)
        }
        StoreConfig::Memory => tracing::warn!("Purchase store: in-memory"),
    }

    // Register Prometheus metrics
    register_metrics();

    // Create shared state
    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };
    let state_data = web::Data::new(state);

    // Configure rate limiter (checkout routes only)
    let governor_conf = match rate_limit(rate_limit_rpm) {
        Some(conf) => conf,
        None => {
            tracing::error!("Invalid RATE_LIMIT_RPM: {}", rate_limit_rpm);
            std::process::exit(1);
        }
    };

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .app_data(web::PayloadConfig::new(BODY_LIMIT))
            .wrap(Logger::default())
            .wrap(build_cors(&allowed_origins))
            .configure(|cfg| routes::configure(cfg, &governor_conf))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
