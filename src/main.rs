mod auth;
mod circuit_breaker;
mod config;
mod db;
mod errors;
mod filters;
mod handlers;
mod models;
mod payment_gateway;
mod purchases;
mod record_store;

use axum::{
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::payment_gateway::PaymentGatewayClient;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Database connection and migrations.
/// - Filter-options cache.
/// - Payment provider client.
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_datamart_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Filter-options cache (60 second TTL); the distinct-value enumeration is
    // seven table scans per miss.
    let filter_options_cache = Cache::builder()
        .time_to_live(Duration::from_secs(60))
        .max_capacity(1)
        .build();
    tracing::info!("Filter options cache initialized");

    // Initialize the payment provider client; the service cannot take orders
    // without it, so startup fails hard here.
    let payment_client = PaymentGatewayClient::new(
        config.payment_base_url.clone(),
        config.payment_key_id.clone(),
        config.payment_key_secret.clone(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize payment client: {}", e))?;
    tracing::info!("Payment provider client initialized: {}", config.payment_base_url);

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
        payment_client,
        filter_options_cache,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // Filter evaluator
        .route("/api/v1/data/filter", post(handlers::filter_data))
        .route("/api/v1/data/filter-options", get(handlers::filter_options))
        // Record store (admin)
        .route("/api/v1/data/upload", post(handlers::upload_records))
        .route("/api/v1/data/all", get(handlers::list_all_records))
        .route(
            "/api/v1/data/:id",
            get(handlers::get_record_by_id)
                .put(handlers::update_record)
                .delete(handlers::delete_record),
        )
        // Payment gateway
        .route("/api/v1/payment/create-order", post(handlers::create_order))
        .route("/api/v1/payment/verify", post(handlers::verify_payment))
        .route("/api/v1/payment/key", get(handlers::payment_key))
        // Purchases
        .route(
            "/api/v1/purchase/complete/:id",
            post(handlers::complete_purchase),
        )
        .route(
            "/api/v1/purchase/my-purchases",
            get(handlers::my_purchases),
        )
        .route("/api/v1/purchase/:id", get(handlers::get_purchase))
        .route("/api/v1/purchase/:id/data", get(handlers::get_purchased_data))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload (bulk record uploads)
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
