//! Grid API library.
//!
//! Serves the canonical grid records written by the preprocessor, plus the
//! static scenario catalog and synthetic environment conditions used by
//! the drift-simulation frontend.

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod encoding;
pub mod handlers;
pub mod metrics;
pub mod state;

use state::AppState;

/// Build the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Grids
        .route("/api/grid-status", get(handlers::grid::grid_status_handler))
        .route("/api/grid/:name", get(handlers::grid::grid_handler))
        // Scenario catalog and environment
        .route("/api/scenarios", get(handlers::scenarios::scenarios_handler))
        .route(
            "/api/environment",
            get(handlers::environment::environment_handler),
        )
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
