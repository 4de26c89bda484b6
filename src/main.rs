//! Community Library Backend
//!
//! REST API over flat JSON files with JWT authentication and role-based access.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod services;
mod store;
mod validation;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::TokenService;
use config::Config;
use services::LibraryService;
use store::Stores;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 10 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<LibraryService>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Community Library Backend");
    tracing::info!("Environment: {:?}", config.environment);
    tracing::info!("Data directory: {:?}", config.data_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Fatal in production when no secret is configured
    let secret = config.signing_secret()?;
    let tokens = Arc::new(TokenService::new(&secret, config.token_ttl_secs));

    // Load collections; the service cannot run without them
    let stores = Stores::load(&config.data_dir).await?;
    let library = Arc::new(LibraryService::new(stores, tokens.clone()));
    library.upgrade_legacy_passwords().await?;

    // Create application state
    let state = AppState {
        library,
        tokens,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    // Token service for the auth layer
    let tokens = state.tokens.clone();

    // Routes reachable without a token
    let public_routes = Router::new()
        .route("/auth/login", post(api::login))
        .route("/auth/register", post(api::register));

    // Routes behind bearer authentication
    let protected_routes = Router::new()
        // Books
        .route("/books", get(api::list_books).post(api::create_book))
        .route(
            "/books/{id}",
            get(api::get_book)
                .put(api::update_book)
                .delete(api::delete_book),
        )
        // Events
        .route("/events", get(api::list_events).post(api::create_event))
        .route(
            "/events/{id}",
            get(api::get_event)
                .put(api::update_event)
                .delete(api::delete_event),
        )
        // Stats
        .route("/stats/monthly-books", get(api::books_per_year))
        .route("/stats/user-roles", get(api::users_per_role))
        // Only matched routes are guarded, so unknown paths still reach the 404 fallback
        .route_layer(middleware::from_fn(move |req, next| {
            auth::require_bearer(tokens.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        .merge(health_routes)
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin when none are configured, otherwise only the listed ones.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
