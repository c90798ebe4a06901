//! Course Catalog Backend
//!
//! A REST backend for cataloging YouTube courses by channel, language,
//! framework, tool and fundamentals topic, with SQLite persistence.

mod api;
mod config;
mod db;
mod errors;
mod models;
mod relative_time;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Course Catalog Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Default locale: {}, allowed locales: {:?}",
        config.default_locale,
        config.allowed_locales
    );

    if config.allowed_locales.is_empty() {
        tracing::warn!(
            "CATALOG_ALLOWED_LOCALES is empty. Searches without `locales` return nothing!"
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool, config.default_locale.clone()));

    // Create application state
    let state = AppState {
        repo,
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
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Courses
        .route("/courses", get(api::list_courses).post(api::create_course))
        .route("/courses/search", get(api::search_courses))
        .route("/courses/count", get(api::count_courses))
        .route("/courses/last-updated", get(api::last_updated))
        .route(
            "/courses/youtube/{youtube_course_id}",
            get(api::get_course_by_youtube_id),
        )
        .route(
            "/courses/{id}",
            get(api::get_course).delete(api::delete_course),
        )
        .route("/courses/{id}/views", post(api::increment_view_count))
        // Channels
        .route("/channels", get(api::list_channels).post(api::create_channel))
        .route("/channels/{youtube_channel_id}", get(api::get_channel))
        // Tags
        .route("/tags/{kind}", get(api::list_tags).post(api::create_tag));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
