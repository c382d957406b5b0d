//! # Slotbook API
//!
//! The HTTP surface of the slotbook booking service: weekly availability rules,
//! free-slot listing, bookings and API key issuance.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Translate HTTP requests into calls on the core services
//! - **Middleware**: Authentication and error-to-status mapping
//! - **Config**: Environment-driven server configuration
//!
//! Handlers hold no business logic; everything that decides whether a slot is
//! free or bookable lives in `slotbook-core`.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Middleware for authentication and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    BoxError, Router,
};
use eyre::Result;
use slotbook_core::services::{AvailabilityService, BookingService};
use slotbook_db::PgStore;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::config::ApiConfig;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub availability: AvailabilityService,
    pub bookings: BookingService,
    /// Used directly for API key storage
    pub db_pool: PgPool,
    pub config: ApiConfig,
}

impl ApiState {
    /// Wires the services to PostgreSQL-backed storage.
    pub fn new(config: ApiConfig, db_pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(db_pool.clone()));
        Self {
            availability: AvailabilityService::new(store.clone(), store.clone()),
            bookings: BookingService::new(store),
            db_pool,
            config,
        }
    }
}

/// Builds the application router with authentication, CORS and timeouts applied.
pub fn build_router(state: Arc<ApiState>) -> Router {
    let protected = Router::new()
        .merge(routes::availability::routes())
        .merge(routes::booking::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let app = Router::new()
        .merge(routes::health::routes())
        .merge(routes::auth::routes())
        .merge(protected)
        .with_state(state.clone());

    let app = match &state.config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(HandleErrorLayer::new(handle_timeout))
            .timeout(Duration::from_secs(state.config.request_timeout)),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
        ])
        .allow_origin(allowed)
        .allow_credentials(true)
}

async fn handle_timeout(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unhandled internal error: {}", err),
        )
    }
}

/// Starts the API server with the provided configuration and database connection
///
/// Installs the global tracing subscriber, builds the router and serves until
/// the listener fails.
pub async fn start_server(config: ApiConfig, db_pool: PgPool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let addr = config.server_addr();
    let state = Arc::new(ApiState::new(config, db_pool));
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
